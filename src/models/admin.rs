use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::Serialize;

use crate::db::DbPool;

#[derive(Debug, Serialize, Clone)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub is_active: bool,
    pub last_login: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Admin {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Admin {
            id: row.get("id")?,
            username: row.get("username")?,
            password_hash: row.get("password_hash")?,
            email: row.get("email")?,
            is_active: row.get::<_, i64>("is_active")? != 0,
            last_login: row.get("last_login")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_username(pool: &DbPool, username: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM admins WHERE username = ?1",
            params![username],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM admins WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn touch_last_login(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE admins SET last_login = CURRENT_TIMESTAMP WHERE id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}

pub struct Session;

impl Session {
    pub fn create(
        pool: &DbPool,
        admin_id: i64,
        token: &str,
        expires_at: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO sessions (id, admin_id, created_at, expires_at, ip_address, user_agent)
             VALUES (?1, ?2, datetime('now'), ?3, ?4, ?5)",
            params![token, admin_id, expires_at, ip, user_agent],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Resolve a bearer token to its admin. Expired or unknown tokens
    /// resolve to None.
    pub fn admin_for_token(pool: &DbPool, token: &str) -> Option<Admin> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT a.* FROM admins a
             JOIN sessions s ON s.admin_id = a.id
             WHERE s.id = ?1 AND s.expires_at > datetime('now')",
            params![token],
            Admin::from_row,
        )
        .ok()
        .filter(|admin| admin.is_active)
    }

    pub fn delete(pool: &DbPool, token: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![token])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn cleanup_expired(pool: &DbPool) -> usize {
        pool.get()
            .ok()
            .and_then(|conn| {
                conn.execute("DELETE FROM sessions WHERE expires_at <= datetime('now')", [])
                    .ok()
            })
            .unwrap_or(0)
    }
}
