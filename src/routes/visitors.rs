use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{ClientIp, UserAgent};
use crate::db::DbPool;
use crate::models::settings::Setting;
use crate::models::visitor::{Visitor, VisitorHit};
use crate::user_agent;
use crate::validate;

use super::{fail, ok, validation_failure, ApiResult};

#[derive(Debug, Deserialize)]
pub struct TrackForm {
    pub session_id: String,
    pub page: String,
    #[serde(default)]
    pub referrer: String,
}

#[post("/track", format = "json", data = "<form>")]
pub fn track(
    pool: &State<DbPool>,
    client_ip: ClientIp,
    ua: UserAgent,
    form: Json<TrackForm>,
) -> ApiResult {
    if !Setting::get_bool(pool, "enable_visitor_tracking") {
        return ok(json!({"tracked": false}));
    }

    let errors = validate::validate_visit(&form.session_id, &form.page, &form.referrer);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    let hit = VisitorHit {
        session_id: &form.session_id,
        page: &form.page,
        referrer: &form.referrer,
        ip: &client_ip.0,
        user_agent: &ua.0,
        device: user_agent::parse(&ua.0),
    };

    match Visitor::track(pool, &hit) {
        Ok(result) => ok(json!(result)),
        Err(e) => {
            log::error!("failed to track visit: {}", e);
            fail(Status::InternalServerError, "Failed to track visit")
        }
    }
}

#[get("/stats")]
pub fn stats(pool: &State<DbPool>) -> ApiResult {
    ok(json!(Visitor::stats(pool)))
}

/// Aggregated dashboards over the visitors table. `timeframe` is one of
/// 7d, 30d, 90d, 1y.
#[get("/analytics?<timeframe>")]
pub fn analytics(pool: &State<DbPool>, timeframe: Option<&str>) -> ApiResult {
    let days = match timeframe.unwrap_or("30d") {
        "7d" => 7,
        "30d" => 30,
        "90d" => 90,
        "1y" => 365,
        _ => return fail(Status::BadRequest, "Timeframe must be one of: 7d, 30d, 90d, 1y"),
    };

    ok(json!(Visitor::analytics(pool, days)))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![track, stats, analytics]
}
