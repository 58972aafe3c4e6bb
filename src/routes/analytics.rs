use rocket::http::{ContentType, Status};
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AdminUser, ClientIp, UserAgent};
use crate::db::DbPool;
use crate::models::page_view::{PageView, StatsPeriod};
use crate::user_agent;
use crate::validate;

use super::{fail, ok, ok_message, validation_failure, ApiResult};

#[derive(Debug, Deserialize)]
pub struct PageViewForm {
    pub session_id: String,
    pub page_url: String,
    pub referrer: Option<String>,
}

#[post("/pageview", format = "json", data = "<form>")]
pub fn pageview(
    pool: &State<DbPool>,
    client_ip: ClientIp,
    ua: UserAgent,
    form: Json<PageViewForm>,
) -> ApiResult {
    let errors = validate::validate_pageview(&form.session_id, &form.page_url);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    let device = user_agent::parse(&ua.0);
    match PageView::record(
        pool,
        &form.page_url,
        &form.session_id,
        form.referrer.as_deref().filter(|r| !r.is_empty()),
        &client_ip.0,
        &ua.0,
        &device,
    ) {
        Ok(()) => ok_message("Page view recorded"),
        Err(e) => {
            log::error!("failed to record page view: {}", e);
            fail(Status::InternalServerError, "Failed to record page view")
        }
    }
}

#[get("/summary?<days>")]
pub fn summary(pool: &State<DbPool>, days: Option<i64>) -> ApiResult {
    let days = days.unwrap_or(30);
    if !(1..=365).contains(&days) {
        return fail(Status::BadRequest, "Days must be between 1 and 365");
    }

    match PageView::summary(pool, days) {
        Some(summary) => ok(json!(summary)),
        None => fail(Status::InternalServerError, "Failed to load summary"),
    }
}

#[get("/realtime")]
pub fn realtime(pool: &State<DbPool>) -> ApiResult {
    match PageView::realtime(pool) {
        Some(stats) => ok(json!(stats)),
        None => fail(Status::InternalServerError, "Failed to load realtime stats"),
    }
}

#[get("/popular-pages?<limit>")]
pub fn popular_pages(pool: &State<DbPool>, limit: Option<i64>) -> ApiResult {
    let limit = limit.unwrap_or(10);
    if !(1..=50).contains(&limit) {
        return fail(Status::BadRequest, "Limit must be between 1 and 50");
    }
    ok(json!({"pages": PageView::popular(pool, limit)}))
}

#[get("/visitor-stats?<period>")]
pub fn visitor_stats(pool: &State<DbPool>, period: Option<&str>) -> ApiResult {
    let period = match StatsPeriod::parse(period.unwrap_or("month")) {
        Some(p) => p,
        None => {
            return fail(
                Status::BadRequest,
                "Period must be one of: today, week, month, year",
            )
        }
    };

    ok(json!({
        "period": period.as_str(),
        "stats": PageView::visitor_stats(pool, period),
    }))
}

#[get("/device-stats")]
pub fn device_stats(pool: &State<DbPool>) -> ApiResult {
    match PageView::device_stats(pool) {
        Some(stats) => ok(json!(stats)),
        None => fail(Status::InternalServerError, "Failed to load device stats"),
    }
}

/// Purge raw analytics older than the given retention window.
#[delete("/cleanup?<days>")]
pub fn cleanup(_admin: AdminUser, pool: &State<DbPool>, days: Option<i64>) -> ApiResult {
    let days = days.unwrap_or(90);
    if !(30..=365).contains(&days) {
        return fail(Status::BadRequest, "Days must be between 30 and 365");
    }

    match PageView::cleanup(pool, days) {
        Ok(deleted) => ok(json!({"deleted": deleted, "retention_days": days})),
        Err(e) => {
            log::error!("analytics cleanup failed: {}", e);
            fail(Status::InternalServerError, "Failed to clean up analytics data")
        }
    }
}

#[derive(Responder)]
pub enum ExportResponse {
    Json((Status, Json<Value>)),
    Csv((ContentType, String)),
}

#[get("/export?<format>&<days>")]
pub fn export(
    _admin: AdminUser,
    pool: &State<DbPool>,
    format: Option<&str>,
    days: Option<i64>,
) -> ExportResponse {
    let days = days.unwrap_or(30).clamp(1, 365);
    let rows = PageView::export(pool, days);

    match format.unwrap_or("json") {
        "csv" => {
            let mut out =
                String::from("page_url,ip_address,device_type,browser,os,referrer,created_at\n");
            for row in &rows {
                out.push_str(&format!(
                    "{},{},{},{},{},{},{}\n",
                    csv_field(&row.page_url),
                    csv_field(row.ip_address.as_deref().unwrap_or("")),
                    csv_field(row.device_type.as_deref().unwrap_or("")),
                    csv_field(row.browser.as_deref().unwrap_or("")),
                    csv_field(row.os.as_deref().unwrap_or("")),
                    csv_field(row.referrer.as_deref().unwrap_or("")),
                    row.created_at,
                ));
            }
            ExportResponse::Csv((ContentType::CSV, out))
        }
        "json" => ExportResponse::Json(ok(json!({"days": days, "rows": rows}))),
        _ => ExportResponse::Json(fail(Status::BadRequest, "Format must be json or csv")),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        pageview,
        summary,
        realtime,
        popular_pages,
        visitor_stats,
        device_stats,
        cleanup,
        export
    ]
}
