use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::time::Duration;

use crate::config::Config;
use crate::db::DbPool;
use crate::models::admin::Session;
use crate::models::page_view::PageView;

pub struct BackgroundTasks;

#[rocket::async_trait]
impl Fairing for BackgroundTasks {
    fn info(&self) -> Info {
        Info {
            name: "Background Tasks",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let pool = rocket
            .state::<DbPool>()
            .expect("DbPool not found in managed state")
            .clone();
        let config = rocket
            .state::<Config>()
            .expect("Config not found in managed state")
            .clone();

        // Expired admin session cleanup
        let p = pool.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(30 * 60)).await;
                let count = Session::cleanup_expired(&p);
                if count > 0 {
                    log::info!("[task] Cleaned up {} expired sessions", count);
                }
            }
        });

        // Analytics retention cleanup, once a day
        let p = pool.clone();
        let retention = config.analytics_retention_days.max(1);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                match PageView::cleanup(&p, retention) {
                    Ok(count) => {
                        if count > 0 {
                            log::info!("[task] Cleaned up {} old analytics records", count);
                        }
                    }
                    Err(e) => log::error!("[task] Analytics cleanup failed: {}", e),
                }
            }
        });

        // Old log file cleanup, once a day
        let logs_dir = config.logs_dir.clone();
        let log_retention = config.log_retention_days.max(1) as u64;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                let removed = cleanup_old_logs(&logs_dir, log_retention);
                if removed > 0 {
                    log::info!("[task] Removed {} old log files", removed);
                }
            }
        });

        log::info!("[task] Background tasks started");
    }
}

/// Delete .log files older than `max_age_days` in `dir`.
fn cleanup_old_logs(dir: &str, max_age_days: u64) -> usize {
    let max_age = Duration::from_secs(max_age_days * 24 * 60 * 60);
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return 0,
    };

    let mut removed = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().map(|ext| ext == "log").unwrap_or(false) {
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.elapsed().ok())
                .map(|age| age > max_age)
                .unwrap_or(false);
            if expired && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
    }
    removed
}
