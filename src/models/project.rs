use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub image_url: Option<String>,
    pub demo_url: Option<String>,
    pub github_url: Option<String>,
    pub technologies: Vec<String>,
    pub category: String,
    pub status: String,
    pub featured: bool,
    pub sort_order: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub image_url: Option<String>,
    pub demo_url: Option<String>,
    pub github_url: Option<String>,
    pub technologies: Vec<String>,
    pub category: String,
    pub status: Option<String>,
    pub featured: Option<bool>,
    pub sort_order: Option<i64>,
}

/// Filters for the public listing endpoint.
#[derive(Debug, Default)]
pub struct ProjectFilter<'a> {
    pub category: Option<&'a str>,
    pub featured: Option<bool>,
    pub status: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ProjectCategoryStats {
    pub category: String,
    pub total_projects: i64,
    pub completed_projects: i64,
    pub in_progress_projects: i64,
    pub featured_projects: i64,
}

#[derive(Debug, Serialize)]
pub struct ProjectOverallStats {
    pub total_projects: i64,
    pub completed_projects: i64,
    pub in_progress_projects: i64,
    pub planned_projects: i64,
    pub featured_projects: i64,
}

pub const PROJECT_CATEGORIES: &[&str] = &["web", "mobile", "desktop", "api", "other"];
pub const PROJECT_STATUSES: &[&str] = &["completed", "in-progress", "planned"];

impl Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let tech_json: String = row.get("technologies")?;
        Ok(Project {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            short_description: row.get("short_description")?,
            image_url: row.get("image_url")?,
            demo_url: row.get("demo_url")?,
            github_url: row.get("github_url")?,
            technologies: serde_json::from_str(&tech_json).unwrap_or_default(),
            category: row.get("category")?,
            status: row.get("status")?,
            featured: row.get::<_, i64>("featured")? != 0,
            sort_order: row.get("sort_order")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn filter_clause<'a>(
        filter: &'a ProjectFilter,
    ) -> (String, Vec<Box<dyn rusqlite::types::ToSql + 'a>>) {
        let mut clauses: Vec<&str> = vec![];
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

        if let Some(category) = filter.category {
            clauses.push("category = ?");
            values.push(Box::new(category.to_string()));
        }
        if let Some(featured) = filter.featured {
            clauses.push("featured = ?");
            values.push(Box::new(featured as i64));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(Box::new(status.to_string()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        (where_clause, values)
    }

    pub fn list(pool: &DbPool, filter: &ProjectFilter, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let (where_clause, mut values) = Self::filter_clause(filter);
        let sql = format!(
            "SELECT * FROM projects {}
             ORDER BY featured DESC, sort_order ASC, created_at DESC
             LIMIT ? OFFSET ?",
            where_clause
        );
        values.push(Box::new(limit));
        values.push(Box::new(offset));

        let mut stmt = match conn.prepare(&sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(|p| p.as_ref()).collect();

        stmt.query_map(params_refs.as_slice(), Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool, filter: &ProjectFilter) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };

        let (where_clause, values) = Self::filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM projects {}", where_clause);
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM projects WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    /// Featured + completed projects for the home page.
    pub fn featured_list(pool: &DbPool, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM projects WHERE featured = 1 AND status = 'completed'
             ORDER BY sort_order ASC, created_at DESC LIMIT ?1",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn overall_stats(pool: &DbPool) -> ProjectOverallStats {
        let empty = ProjectOverallStats {
            total_projects: 0,
            completed_projects: 0,
            in_progress_projects: 0,
            planned_projects: 0,
            featured_projects: 0,
        };
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return empty,
        };
        conn.query_row(
            "SELECT
                COUNT(*),
                COUNT(CASE WHEN status = 'completed' THEN 1 END),
                COUNT(CASE WHEN status = 'in-progress' THEN 1 END),
                COUNT(CASE WHEN status = 'planned' THEN 1 END),
                COUNT(CASE WHEN featured = 1 THEN 1 END)
             FROM projects",
            [],
            |row| {
                Ok(ProjectOverallStats {
                    total_projects: row.get(0)?,
                    completed_projects: row.get(1)?,
                    in_progress_projects: row.get(2)?,
                    planned_projects: row.get(3)?,
                    featured_projects: row.get(4)?,
                })
            },
        )
        .unwrap_or(empty)
    }

    pub fn category_stats(pool: &DbPool) -> Vec<ProjectCategoryStats> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT
                category,
                COUNT(*) as total_projects,
                COUNT(CASE WHEN status = 'completed' THEN 1 END) as completed_projects,
                COUNT(CASE WHEN status = 'in-progress' THEN 1 END) as in_progress_projects,
                COUNT(CASE WHEN featured = 1 THEN 1 END) as featured_projects
             FROM projects
             GROUP BY category
             ORDER BY total_projects DESC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], |row| {
            Ok(ProjectCategoryStats {
                category: row.get(0)?,
                total_projects: row.get(1)?,
                completed_projects: row.get(2)?,
                in_progress_projects: row.get(3)?,
                featured_projects: row.get(4)?,
            })
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &ProjectForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let tech_json = serde_json::to_string(&form.technologies).map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO projects (title, description, short_description, image_url, demo_url,
                 github_url, technologies, category, status, featured, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                form.title,
                form.description,
                form.short_description,
                form.image_url,
                form.demo_url,
                form.github_url,
                tech_json,
                form.category,
                form.status.as_deref().unwrap_or("completed"),
                form.featured.unwrap_or(false) as i64,
                form.sort_order.unwrap_or(0),
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    /// Returns false when no row with that id exists.
    pub fn update(pool: &DbPool, id: i64, form: &ProjectForm) -> Result<bool, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let tech_json = serde_json::to_string(&form.technologies).map_err(|e| e.to_string())?;
        let changed = conn
            .execute(
                "UPDATE projects SET
                    title = ?1, description = ?2, short_description = ?3, image_url = ?4,
                    demo_url = ?5, github_url = ?6, technologies = ?7, category = ?8,
                    status = ?9, featured = ?10, sort_order = ?11, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?12",
                params![
                    form.title,
                    form.description,
                    form.short_description,
                    form.image_url,
                    form.demo_url,
                    form.github_url,
                    tech_json,
                    form.category,
                    form.status.as_deref().unwrap_or("completed"),
                    form.featured.unwrap_or(false) as i64,
                    form.sort_order.unwrap_or(0),
                    id,
                ],
            )
            .map_err(|e| e.to_string())?;
        Ok(changed > 0)
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<bool, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let changed = conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(changed > 0)
    }
}
