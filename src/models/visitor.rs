use chrono::Utc;
use rusqlite::params;
use serde::Serialize;

use crate::db::DbPool;
use crate::models::site_stats::SiteStat;
use crate::user_agent::DeviceInfo;

/// Tracking beacon payload after validation, ready to persist.
#[derive(Debug)]
pub struct VisitorHit<'a> {
    pub session_id: &'a str,
    pub page: &'a str,
    pub referrer: &'a str,
    pub ip: &'a str,
    pub user_agent: &'a str,
    pub device: DeviceInfo,
}

#[derive(Debug, Serialize)]
pub struct TrackResult {
    pub visitor_id: i64,
    pub is_new_visitor: bool,
    pub is_new_session: bool,
}

#[derive(Debug, Serialize)]
pub struct VisitorStats {
    pub total_visitors: i64,
    pub unique_visitors: i64,
    pub page_views: i64,
    pub today_views: i64,
    pub today_unique: i64,
}

#[derive(Debug, Serialize)]
pub struct DailyStat {
    pub visit_date: String,
    pub page_views: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Serialize)]
pub struct PageStat {
    pub page: String,
    pub views: i64,
    pub unique_views: i64,
}

#[derive(Debug, Serialize)]
pub struct ShareStat {
    pub label: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct SourceStat {
    pub source: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct VisitorAnalytics {
    pub timeframe: i64,
    pub daily_stats: Vec<DailyStat>,
    pub top_pages: Vec<PageStat>,
    pub device_stats: Vec<ShareStat>,
    pub browser_stats: Vec<ShareStat>,
    pub referrer_stats: Vec<SourceStat>,
}

pub struct Visitor;

impl Visitor {
    /// Record one tracking beacon. A visitor counts as unique once per
    /// (session_id, visit_date) — repeat hits the same day bump page_views
    /// and total_visitors only.
    pub fn track(pool: &DbPool, hit: &VisitorHit) -> Result<TrackResult, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let visit_date = Utc::now().date_naive().to_string();

        let is_new_visitor = !Self::session_exists(&conn, hit.session_id, None)?;
        let is_new_session = !Self::session_exists(&conn, hit.session_id, Some(&visit_date))?;

        conn.execute(
            "INSERT INTO visitors (session_id, ip_address, user_agent, page, referrer,
                 device_type, browser, os, visit_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                hit.session_id,
                hit.ip,
                hit.user_agent,
                hit.page,
                hit.referrer,
                hit.device.device_type,
                hit.device.browser,
                hit.device.os,
                visit_date,
            ],
        )
        .map_err(|e| e.to_string())?;
        let visitor_id = conn.last_insert_rowid();
        drop(conn);

        SiteStat::increment(pool, "page_views")?;
        SiteStat::increment(pool, "total_visitors")?;
        if is_new_session {
            SiteStat::increment(pool, "unique_visitors")?;
        }

        Ok(TrackResult {
            visitor_id,
            is_new_visitor,
            is_new_session,
        })
    }

    fn session_exists(
        conn: &rusqlite::Connection,
        session_id: &str,
        visit_date: Option<&str>,
    ) -> Result<bool, String> {
        let count: i64 = match visit_date {
            Some(date) => conn
                .query_row(
                    "SELECT COUNT(*) FROM visitors WHERE session_id = ?1 AND visit_date = ?2",
                    params![session_id, date],
                    |row| row.get(0),
                )
                .map_err(|e| e.to_string())?,
            None => conn
                .query_row(
                    "SELECT COUNT(*) FROM visitors WHERE session_id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )
                .map_err(|e| e.to_string())?,
        };
        Ok(count > 0)
    }

    pub fn stats(pool: &DbPool) -> VisitorStats {
        let (today_views, today_unique) = pool
            .get()
            .ok()
            .and_then(|conn| {
                conn.query_row(
                    "SELECT COUNT(*), COUNT(DISTINCT session_id)
                     FROM visitors WHERE visit_date = date('now')",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .ok()
            })
            .unwrap_or((0, 0));

        VisitorStats {
            total_visitors: SiteStat::get(pool, "total_visitors"),
            unique_visitors: SiteStat::get(pool, "unique_visitors"),
            page_views: SiteStat::get(pool, "page_views"),
            today_views,
            today_unique,
        }
    }

    pub fn analytics(pool: &DbPool, days: i64) -> VisitorAnalytics {
        let empty = VisitorAnalytics {
            timeframe: days,
            daily_stats: vec![],
            top_pages: vec![],
            device_stats: vec![],
            browser_stats: vec![],
            referrer_stats: vec![],
        };
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return empty,
        };
        let cutoff = format!("-{} days", days);

        let daily_stats = conn
            .prepare(
                "SELECT visit_date, COUNT(*) as page_views, COUNT(DISTINCT session_id) as unique_visitors
                 FROM visitors WHERE visit_date >= date('now', ?1)
                 GROUP BY visit_date ORDER BY visit_date ASC",
            )
            .and_then(|mut stmt| {
                stmt.query_map(params![cutoff], |row| {
                    Ok(DailyStat {
                        visit_date: row.get(0)?,
                        page_views: row.get(1)?,
                        unique_visitors: row.get(2)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        let top_pages = conn
            .prepare(
                "SELECT page, COUNT(*) as views, COUNT(DISTINCT session_id) as unique_views
                 FROM visitors WHERE visit_date >= date('now', ?1)
                 GROUP BY page ORDER BY views DESC LIMIT 10",
            )
            .and_then(|mut stmt| {
                stmt.query_map(params![cutoff], |row| {
                    Ok(PageStat {
                        page: row.get(0)?,
                        views: row.get(1)?,
                        unique_views: row.get(2)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        let device_stats = Self::share_stats(&conn, "device_type", &cutoff);
        let browser_stats = Self::share_stats(&conn, "browser", &cutoff);

        let referrer_stats = conn
            .prepare(
                "SELECT CASE
                    WHEN referrer = '' OR referrer IS NULL THEN 'Direct'
                    WHEN referrer LIKE '%google%' THEN 'Google'
                    WHEN referrer LIKE '%github%' THEN 'GitHub'
                    WHEN referrer LIKE '%linkedin%' THEN 'LinkedIn'
                    WHEN referrer LIKE '%twitter%' THEN 'Twitter'
                    ELSE 'Other'
                 END as source, COUNT(*) as count
                 FROM visitors WHERE visit_date >= date('now', ?1)
                 GROUP BY source ORDER BY count DESC",
            )
            .and_then(|mut stmt| {
                stmt.query_map(params![cutoff], |row| {
                    Ok(SourceStat {
                        source: row.get(0)?,
                        count: row.get(1)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        VisitorAnalytics {
            timeframe: days,
            daily_stats,
            top_pages,
            device_stats,
            browser_stats,
            referrer_stats,
        }
    }

    // `column` is always a fixed identifier from the callers above, never
    // user input.
    fn share_stats(conn: &rusqlite::Connection, column: &str, cutoff: &str) -> Vec<ShareStat> {
        let sql = format!(
            "SELECT {col}, COUNT(*) as count,
                ROUND(100.0 * COUNT(*) / (SELECT COUNT(*) FROM visitors WHERE visit_date >= date('now', ?1)), 1) as percentage
             FROM visitors WHERE visit_date >= date('now', ?1)
             GROUP BY {col} ORDER BY count DESC",
            col = column
        );
        conn.prepare(&sql)
            .and_then(|mut stmt| {
                stmt.query_map(params![cutoff], |row| {
                    Ok(ShareStat {
                        label: row.get(0)?,
                        count: row.get(1)?,
                        percentage: row.get(2)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default()
    }
}
