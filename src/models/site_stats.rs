use std::collections::HashMap;

use rusqlite::params;

use crate::db::DbPool;

/// Site-wide counters (`site_stats` table): total_visitors, unique_visitors,
/// page_views, contact_submissions, feedback_submissions.
pub struct SiteStat;

impl SiteStat {
    pub fn increment(pool: &DbPool, name: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE site_stats
             SET stat_value = stat_value + 1, updated_at = CURRENT_TIMESTAMP
             WHERE stat_name = ?1",
            params![name],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn get(pool: &DbPool, name: &str) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT stat_value FROM site_stats WHERE stat_name = ?1",
            params![name],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    pub fn all(pool: &DbPool) -> HashMap<String, i64> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };
        let mut stmt = match conn.prepare("SELECT stat_name, stat_value FROM site_stats") {
            Ok(s) => s,
            Err(_) => return HashMap::new(),
        };
        stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }
}
