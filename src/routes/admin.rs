use std::path::Path;
use std::time::Duration;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, AdminUser, ClientIp, UserAgent};
use crate::config::Config;
use crate::db::DbPool;
use crate::models::admin::Admin;
use crate::models::contact::ContactMessage;
use crate::models::feedback::Feedback;
use crate::models::project::Project;
use crate::models::settings::Setting;
use crate::models::visitor::Visitor;
use crate::rate_limit::RateLimiter;
use crate::validate;

use super::{fail, ok, ok_message, pagination, validation_failure, ApiResult};

const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[post("/login", format = "json", data = "<form>")]
pub fn login(
    pool: &State<DbPool>,
    config: &State<Config>,
    limiter: &State<RateLimiter>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    form: Json<LoginForm>,
) -> ApiResult {
    let ip_hash = auth::hash_ip(&client_ip.0);
    let rate_key = format!("login:{}", ip_hash);
    let max_attempts = Setting::get_i64(pool, "login_rate_limit").max(1) as u64;

    if !limiter.check_and_record(&rate_key, max_attempts, LOGIN_WINDOW) {
        let retry_after = limiter.retry_after(&rate_key, LOGIN_WINDOW);
        return (
            Status::TooManyRequests,
            Json(json!({
                "success": false,
                "message": "Too many login attempts. Please try again later.",
                "retry_after_secs": retry_after,
            })),
        );
    }

    let errors = validate::validate_login(&form.username, &form.password);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    let admin = match Admin::find_by_username(pool, form.username.trim()) {
        Some(a) if a.is_active => a,
        _ => {
            log::warn!("failed login attempt for '{}' from {}", form.username, client_ip.0);
            return fail(Status::Unauthorized, "Invalid credentials");
        }
    };

    if !auth::verify_password(&form.password, &admin.password_hash) {
        log::warn!("failed login attempt for '{}' from {}", form.username, client_ip.0);
        return fail(Status::Unauthorized, "Invalid credentials");
    }

    let token = match auth::create_session(
        pool,
        config,
        admin.id,
        Some(&client_ip.0),
        Some(&user_agent.0),
    ) {
        Ok(t) => t,
        Err(e) => {
            log::error!("failed to create session: {}", e);
            return fail(Status::InternalServerError, "Login failed");
        }
    };

    if let Err(e) = Admin::touch_last_login(pool, admin.id) {
        log::warn!("failed to record last login: {}", e);
    }

    ok(json!({
        "token": token,
        "expires_in_hours": config.session_expiry_hours,
        "admin": {
            "id": admin.id,
            "username": admin.username,
            "email": admin.email,
        },
    }))
}

#[post("/logout")]
pub fn logout(admin: AdminUser, pool: &State<DbPool>) -> ApiResult {
    match auth::destroy_session(pool, &admin.token) {
        Ok(()) => ok_message("Logged out"),
        Err(e) => {
            log::error!("failed to destroy session: {}", e);
            fail(Status::InternalServerError, "Logout failed")
        }
    }
}

/// Counters for the admin landing page, in one round trip.
#[get("/dashboard")]
pub fn dashboard(_admin: AdminUser, pool: &State<DbPool>) -> ApiResult {
    ok(json!({
        "messages": {
            "total": ContactMessage::count(pool, None),
            "new": ContactMessage::count(pool, Some("new")),
            "last_7_days": ContactMessage::recent_count(pool, 7),
        },
        "feedback": {
            "total": Feedback::count(pool),
            "average_rating": Feedback::average_rating(pool),
        },
        "projects": Project::overall_stats(pool),
        "visitors": Visitor::stats(pool),
    }))
}

#[get("/messages?<status>&<page>&<limit>")]
pub fn messages(
    _admin: AdminUser,
    pool: &State<DbPool>,
    status: Option<&str>,
    page: Option<i64>,
    limit: Option<i64>,
) -> ApiResult {
    if let Some(s) = status {
        let errors = validate::validate_contact_status(s);
        if !errors.is_empty() {
            return validation_failure(errors);
        }
    }

    let limit = validate::clamp(limit, 20, 1, 100);
    let page = page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit;

    let entries = ContactMessage::list(pool, status, limit, offset);
    let total = ContactMessage::count(pool, status);

    ok(json!({
        "messages": entries,
        "pagination": pagination(page, limit, total),
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[patch("/messages/<id>/status", format = "json", data = "<body>")]
pub fn update_message_status(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    body: Json<StatusBody>,
) -> ApiResult {
    let errors = validate::validate_contact_status(&body.status);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    match ContactMessage::update_status(pool, id, &body.status) {
        Ok(true) => ok_message("Message status updated"),
        Ok(false) => fail(Status::NotFound, "Message not found"),
        Err(e) => {
            log::error!("failed to update message {}: {}", id, e);
            fail(Status::InternalServerError, "Failed to update message")
        }
    }
}

#[delete("/messages/<id>")]
pub fn delete_message(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> ApiResult {
    match ContactMessage::delete(pool, id) {
        Ok(true) => ok_message("Message deleted"),
        Ok(false) => fail(Status::NotFound, "Message not found"),
        Err(e) => {
            log::error!("failed to delete message {}: {}", id, e);
            fail(Status::InternalServerError, "Failed to delete message")
        }
    }
}

// ── File upload ──

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "pdf"];

#[derive(FromForm)]
pub struct Upload<'r> {
    pub file: TempFile<'r>,
}

#[post("/upload", data = "<upload>")]
pub async fn upload(
    _admin: AdminUser,
    config: &State<Config>,
    mut upload: Form<Upload<'_>>,
) -> ApiResult {
    let file = &mut upload.file;

    if file.len() > config.max_upload_bytes {
        return fail(Status::PayloadTooLarge, "File too large");
    }

    let ext = file
        .content_type()
        .and_then(|ct| ct.extension())
        .map(|e| e.as_str().to_lowercase());
    let ext = match ext {
        Some(e) if ALLOWED_EXTENSIONS.contains(&e.as_str()) => e,
        _ => return fail(Status::BadRequest, "File type not allowed"),
    };

    let filename = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    let dest = Path::new(&config.uploads_dir).join(&filename);

    match file.copy_to(&dest).await {
        Ok(()) => ok(json!({
            "filename": filename,
            "url": format!("/uploads/{}", filename),
        })),
        Err(e) => {
            log::error!("failed to persist upload: {}", e);
            fail(Status::InternalServerError, "Failed to store file")
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login, logout, dashboard, messages, update_message_status, delete_message]
}

/// Mounted at /api, not /api/admin.
pub fn upload_routes() -> Vec<rocket::Route> {
    routes![upload]
}
