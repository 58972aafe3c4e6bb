use chrono::NaiveDateTime;
use rusqlite::params;
use serde::Serialize;

use crate::db::DbPool;
use crate::user_agent::DeviceInfo;

#[derive(Debug, Serialize)]
pub struct PopularPage {
    pub page_url: String,
    pub view_count: i64,
    pub unique_visitors: i64,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct DailyViews {
    pub date: String,
    pub views: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct PercentEntry {
    pub label: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub total_views: i64,
    pub unique_visitors: i64,
    pub popular_pages: Vec<PopularPage>,
    pub daily_views: Vec<DailyViews>,
    pub device_types: Vec<CountEntry>,
    pub browsers: Vec<CountEntry>,
    pub referrers: Vec<CountEntry>,
    pub period: String,
}

#[derive(Debug, Serialize)]
pub struct HourlyViews {
    pub hour: String,
    pub views: i64,
}

#[derive(Debug, Serialize)]
pub struct RealtimeStats {
    pub active_sessions: i64,
    pub recent_views: i64,
    pub hourly_views: Vec<HourlyViews>,
}

#[derive(Debug, Serialize)]
pub struct PeriodCount {
    pub period: String,
    pub page_views: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Serialize)]
pub struct DeviceBreakdown {
    pub devices: Vec<PercentEntry>,
    pub browsers: Vec<PercentEntry>,
    pub operating_systems: Vec<PercentEntry>,
}

#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub page_url: String,
    pub ip_address: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub referrer: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Reporting granularity for the visitor-stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPeriod {
    Today,
    Week,
    Month,
    Year,
}

impl StatsPeriod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(StatsPeriod::Today),
            "week" => Some(StatsPeriod::Week),
            "month" => Some(StatsPeriod::Month),
            "year" => Some(StatsPeriod::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatsPeriod::Today => "today",
            StatsPeriod::Week => "week",
            StatsPeriod::Month => "month",
            StatsPeriod::Year => "year",
        }
    }

    fn clauses(&self) -> (&'static str, &'static str) {
        match self {
            StatsPeriod::Today => ("DATE(created_at) = DATE('now')", "strftime('%H', created_at)"),
            StatsPeriod::Week => ("created_at >= datetime('now', '-7 days')", "DATE(created_at)"),
            StatsPeriod::Month => ("created_at >= datetime('now', '-30 days')", "DATE(created_at)"),
            StatsPeriod::Year => {
                ("created_at >= datetime('now', '-365 days')", "strftime('%Y-%m', created_at)")
            }
        }
    }
}

pub struct PageView;

impl PageView {
    /// Record a page view beacon: inserts the raw row, bumps the browsing
    /// session and the per-page counters. The per-page unique count only
    /// moves when this is the IP's first view of the page today.
    pub fn record(
        pool: &DbPool,
        page_url: &str,
        session_id: &str,
        referrer: Option<&str>,
        ip: &str,
        user_agent: &str,
        device: &DeviceInfo,
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;

        conn.execute(
            "INSERT INTO page_views (page_url, session_id, ip_address, user_agent, referrer,
                 device_type, browser, os)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                page_url,
                session_id,
                ip,
                user_agent,
                referrer,
                device.device_type,
                device.browser,
                device.os
            ],
        )
        .map_err(|e| e.to_string())?;

        // Upsert the browsing session
        conn.execute(
            "INSERT INTO user_sessions (session_id, ip_address, user_agent)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE SET
                 last_activity = CURRENT_TIMESTAMP,
                 page_count = page_count + 1",
            params![session_id, ip, user_agent],
        )
        .map_err(|e| e.to_string())?;

        // First view of this page by this IP today counts as unique
        let views_today: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM page_views
                 WHERE page_url = ?1 AND ip_address = ?2 AND DATE(created_at) = DATE('now')",
                params![page_url, ip],
                |row| row.get(0),
            )
            .map_err(|e| e.to_string())?;
        let unique_bump = if views_today == 1 { 1 } else { 0 };

        conn.execute(
            "INSERT INTO popular_pages (page_url, view_count, unique_visitors)
             VALUES (?1, 1, 1)
             ON CONFLICT(page_url) DO UPDATE SET
                 view_count = view_count + 1,
                 unique_visitors = unique_visitors + ?2,
                 last_updated = CURRENT_TIMESTAMP",
            params![page_url, unique_bump],
        )
        .map_err(|e| e.to_string())?;

        Ok(())
    }

    pub fn summary(pool: &DbPool, days: i64) -> Option<AnalyticsSummary> {
        let conn = pool.get().ok()?;
        let cutoff = format!("-{} days", days);

        let (total_views, unique_visitors) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(DISTINCT ip_address) FROM page_views
                 WHERE created_at >= datetime('now', ?1)",
                params![cutoff],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .ok()?;

        let daily_views = conn
            .prepare(
                "SELECT DATE(created_at) as date, COUNT(*) as views,
                        COUNT(DISTINCT ip_address) as unique_visitors
                 FROM page_views WHERE created_at >= datetime('now', ?1)
                 GROUP BY DATE(created_at) ORDER BY date DESC LIMIT 30",
            )
            .and_then(|mut stmt| {
                stmt.query_map(params![cutoff], |row| {
                    Ok(DailyViews {
                        date: row.get(0)?,
                        views: row.get(1)?,
                        unique_visitors: row.get(2)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        let device_types = Self::count_entries(&conn, "device_type", &cutoff, None);
        let browsers = Self::count_entries(&conn, "browser", &cutoff, Some(10));

        let referrers = conn
            .prepare(
                "SELECT referrer, COUNT(*) as count FROM page_views
                 WHERE created_at >= datetime('now', ?1)
                   AND referrer IS NOT NULL AND referrer != ''
                 GROUP BY referrer ORDER BY count DESC LIMIT 10",
            )
            .and_then(|mut stmt| {
                stmt.query_map(params![cutoff], |row| {
                    Ok(CountEntry {
                        label: row.get(0)?,
                        count: row.get(1)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        Some(AnalyticsSummary {
            total_views,
            unique_visitors,
            popular_pages: Self::popular(pool, 10),
            daily_views,
            device_types,
            browsers,
            referrers,
            period: format!("{} days", days),
        })
    }

    fn count_entries(
        conn: &rusqlite::Connection,
        column: &str,
        cutoff: &str,
        limit: Option<i64>,
    ) -> Vec<CountEntry> {
        let limit_clause = limit.map(|l| format!(" LIMIT {}", l)).unwrap_or_default();
        let sql = format!(
            "SELECT {col}, COUNT(*) as count FROM page_views
             WHERE created_at >= datetime('now', ?1) AND {col} IS NOT NULL
             GROUP BY {col} ORDER BY count DESC{limit}",
            col = column,
            limit = limit_clause
        );
        conn.prepare(&sql)
            .and_then(|mut stmt| {
                stmt.query_map(params![cutoff], |row| {
                    Ok(CountEntry {
                        label: row.get(0)?,
                        count: row.get(1)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default()
    }

    pub fn realtime(pool: &DbPool) -> Option<RealtimeStats> {
        let conn = pool.get().ok()?;

        let active_sessions: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM user_sessions
                 WHERE last_activity >= datetime('now', '-30 minutes')",
                [],
                |row| row.get(0),
            )
            .ok()?;

        let recent_views: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM page_views WHERE created_at >= datetime('now', '-24 hours')",
                [],
                |row| row.get(0),
            )
            .ok()?;

        let hourly_views = conn
            .prepare(
                "SELECT strftime('%H', created_at) as hour, COUNT(*) as views
                 FROM page_views WHERE created_at >= datetime('now', '-24 hours')
                 GROUP BY hour ORDER BY hour",
            )
            .and_then(|mut stmt| {
                stmt.query_map([], |row| {
                    Ok(HourlyViews {
                        hour: row.get(0)?,
                        views: row.get(1)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        Some(RealtimeStats {
            active_sessions,
            recent_views,
            hourly_views,
        })
    }

    pub fn popular(pool: &DbPool, limit: i64) -> Vec<PopularPage> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT page_url, view_count, unique_visitors, last_updated
             FROM popular_pages ORDER BY view_count DESC LIMIT ?1",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit], |row| {
            Ok(PopularPage {
                page_url: row.get(0)?,
                view_count: row.get(1)?,
                unique_visitors: row.get(2)?,
                last_updated: row.get(3)?,
            })
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    pub fn visitor_stats(pool: &DbPool, period: StatsPeriod) -> Vec<PeriodCount> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let (where_clause, group_by) = period.clauses();
        let sql = format!(
            "SELECT {group} as period, COUNT(*) as page_views,
                    COUNT(DISTINCT ip_address) as unique_visitors
             FROM page_views WHERE {cond}
             GROUP BY {group} ORDER BY period",
            group = group_by,
            cond = where_clause
        );
        conn.prepare(&sql)
            .and_then(|mut stmt| {
                stmt.query_map([], |row| {
                    Ok(PeriodCount {
                        period: row.get(0)?,
                        page_views: row.get(1)?,
                        unique_visitors: row.get(2)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default()
    }

    /// Device/browser/OS split with percentages over the last 30 days.
    pub fn device_stats(pool: &DbPool) -> Option<DeviceBreakdown> {
        let conn = pool.get().ok()?;
        Some(DeviceBreakdown {
            devices: Self::percent_entries(&conn, "device_type", None),
            browsers: Self::percent_entries(&conn, "browser", Some(10)),
            operating_systems: Self::percent_entries(&conn, "os", Some(10)),
        })
    }

    fn percent_entries(
        conn: &rusqlite::Connection,
        column: &str,
        limit: Option<i64>,
    ) -> Vec<PercentEntry> {
        let limit_clause = limit.map(|l| format!(" LIMIT {}", l)).unwrap_or_default();
        let sql = format!(
            "SELECT {col}, COUNT(*) as count,
                ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM page_views
                    WHERE {col} IS NOT NULL
                    AND created_at >= datetime('now', '-30 days')), 2) as percentage
             FROM page_views
             WHERE {col} IS NOT NULL AND created_at >= datetime('now', '-30 days')
             GROUP BY {col} ORDER BY count DESC{limit}",
            col = column,
            limit = limit_clause
        );
        conn.prepare(&sql)
            .and_then(|mut stmt| {
                stmt.query_map([], |row| {
                    Ok(PercentEntry {
                        label: row.get(0)?,
                        count: row.get(1)?,
                        percentage: row.get(2)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default()
    }

    /// Delete page views older than `days` days plus stale inactive
    /// sessions. Returns the number of page-view rows removed.
    pub fn cleanup(pool: &DbPool, days: i64) -> Result<usize, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let cutoff = format!("-{} days", days);

        let deleted = conn
            .execute(
                "DELETE FROM page_views WHERE created_at < datetime('now', ?1)",
                params![cutoff],
            )
            .map_err(|e| e.to_string())?;

        conn.execute(
            "DELETE FROM user_sessions
             WHERE last_activity < datetime('now', ?1) AND is_active = 0",
            params![cutoff],
        )
        .map_err(|e| e.to_string())?;

        Ok(deleted)
    }

    pub fn export(pool: &DbPool, days: i64) -> Vec<ExportRow> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let cutoff = format!("-{} days", days);
        let mut stmt = match conn.prepare(
            "SELECT page_url, ip_address, device_type, browser, os, referrer, created_at
             FROM page_views WHERE created_at >= datetime('now', ?1)
             ORDER BY created_at DESC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![cutoff], |row| {
            Ok(ExportRow {
                page_url: row.get(0)?,
                ip_address: row.get(1)?,
                device_type: row.get(2)?,
                browser: row.get(3)?,
                os: row.get(4)?,
                referrer: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }
}
