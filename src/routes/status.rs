use std::path::PathBuf;
use std::time::Instant;

use rocket::fs::NamedFile;
use rocket::State;
use serde_json::json;

use crate::config::Config;

use super::{ok, ApiResult};

/// Process start time, for uptime reporting.
pub struct StartTime(pub Instant);

#[get("/health")]
pub fn health(start: &State<StartTime>) -> ApiResult {
    ok(json!({
        "status": "healthy",
        "uptime_secs": start.0.elapsed().as_secs(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[get("/status")]
pub fn api_status() -> ApiResult {
    ok(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Client-side routes all resolve to the SPA entry point. Static assets
/// are served by the FileServer at a higher rank, API paths fall through
/// to the JSON 404 catcher.
#[get("/<path..>", rank = 20)]
pub async fn spa_fallback(path: PathBuf, config: &State<Config>) -> Option<NamedFile> {
    if path.starts_with("api") || path.starts_with("uploads") {
        return None;
    }
    NamedFile::open(std::path::Path::new(&config.static_dir).join("index.html"))
        .await
        .ok()
}

#[options("/<_..>")]
pub fn cors_preflight() -> rocket::http::Status {
    rocket::http::Status::NoContent
}

pub fn root_routes() -> Vec<rocket::Route> {
    routes![health, spa_fallback, cors_preflight]
}

pub fn api_routes() -> Vec<rocket::Route> {
    routes![api_status]
}
