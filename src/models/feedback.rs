use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Feedback {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub rating: i64,
    pub category: String,
    pub feedback: String,
    pub is_public: bool,
    pub is_approved: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub name: String,
    pub email: Option<String>,
    pub rating: i64,
    pub category: String,
    pub feedback: String,
    #[serde(default)]
    pub is_public: bool,
}

/// Public projection — never exposes email or IP.
#[derive(Debug, Serialize)]
pub struct PublicFeedback {
    pub id: i64,
    pub name: String,
    pub rating: i64,
    pub category: String,
    pub feedback: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub count: i64,
    pub avg_rating: f64,
}

pub const FEEDBACK_CATEGORIES: &[&str] = &["design", "functionality", "content", "overall"];

impl Feedback {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Feedback {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            rating: row.get("rating")?,
            category: row.get("category")?,
            feedback: row.get("feedback")?,
            is_public: row.get::<_, i64>("is_public")? != 0,
            is_approved: row.get::<_, i64>("is_approved")? != 0,
            ip_address: row.get("ip_address")?,
            user_agent: row.get("user_agent")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(
        pool: &DbPool,
        form: &FeedbackForm,
        ip: &str,
        user_agent: &str,
    ) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO feedback (name, email, rating, category, feedback, is_public, ip_address, user_agent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                form.name,
                form.email,
                form.rating,
                form.category,
                form.feedback,
                form.is_public as i64,
                ip,
                user_agent
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM feedback WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn list(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn
            .prepare("SELECT * FROM feedback ORDER BY created_at DESC LIMIT ?1 OFFSET ?2")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM feedback", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn average_rating(pool: &DbPool) -> f64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0.0,
        };
        conn.query_row(
            "SELECT COALESCE(AVG(rating), 0) FROM feedback WHERE rating > 0",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0.0)
    }

    /// Approved + public entries for the testimonials page.
    pub fn public_list(
        pool: &DbPool,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Vec<PublicFeedback> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match category {
            Some(c) => (
                "SELECT id, name, rating, category, feedback, created_at FROM feedback
                 WHERE is_public = 1 AND is_approved = 1 AND category = ?1
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
                    .to_string(),
                vec![Box::new(c.to_string()), Box::new(limit), Box::new(offset)],
            ),
            None => (
                "SELECT id, name, rating, category, feedback, created_at FROM feedback
                 WHERE is_public = 1 AND is_approved = 1
                 ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
                    .to_string(),
                vec![Box::new(limit), Box::new(offset)],
            ),
        };

        let mut stmt = match conn.prepare(&sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        stmt.query_map(params_refs.as_slice(), |row| {
            Ok(PublicFeedback {
                id: row.get(0)?,
                name: row.get(1)?,
                rating: row.get(2)?,
                category: row.get(3)?,
                feedback: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    pub fn public_count(pool: &DbPool, category: Option<&str>) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        match category {
            Some(c) => conn
                .query_row(
                    "SELECT COUNT(*) FROM feedback
                     WHERE is_public = 1 AND is_approved = 1 AND category = ?1",
                    params![c],
                    |row| row.get(0),
                )
                .unwrap_or(0),
            None => conn
                .query_row(
                    "SELECT COUNT(*) FROM feedback WHERE is_public = 1 AND is_approved = 1",
                    [],
                    |row| row.get(0),
                )
                .unwrap_or(0),
        }
    }

    /// Per-category count and average rating over approved public entries.
    pub fn category_stats(pool: &DbPool) -> Vec<CategoryStat> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT category, COUNT(*) as count, AVG(rating) as avg_rating
             FROM feedback WHERE is_public = 1 AND is_approved = 1
             GROUP BY category",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], |row| {
            Ok(CategoryStat {
                category: row.get(0)?,
                count: row.get(1)?,
                avg_rating: row.get(2)?,
            })
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    /// Returns false when no row with that id exists.
    pub fn set_approved(pool: &DbPool, id: i64, approved: bool) -> Result<bool, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let changed = conn
            .execute(
                "UPDATE feedback SET is_approved = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                params![approved as i64, id],
            )
            .map_err(|e| e.to_string())?;
        Ok(changed > 0)
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<bool, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let changed = conn
            .execute("DELETE FROM feedback WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(changed > 0)
    }
}
