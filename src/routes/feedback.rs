use std::time::Duration;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, AdminUser, ClientIp, UserAgent};
use crate::config::Config;
use crate::db::DbPool;
use crate::email;
use crate::models::feedback::{Feedback, FeedbackForm, FEEDBACK_CATEGORIES};
use crate::models::settings::Setting;
use crate::models::site_stats::SiteStat;
use crate::rate_limit::RateLimiter;
use crate::validate;

use super::{created, fail, ok, ok_message, pagination, validation_failure, ApiResult};

const RATE_WINDOW: Duration = Duration::from_secs(15 * 60);

#[post("/", format = "json", data = "<form>")]
pub fn submit(
    pool: &State<DbPool>,
    config: &State<Config>,
    limiter: &State<RateLimiter>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    form: Json<FeedbackForm>,
) -> ApiResult {
    let ip_hash = auth::hash_ip(&client_ip.0);
    let max_attempts = Setting::get_i64(pool, "feedback_rate_limit").max(1) as u64;
    if !limiter.check_and_record(&format!("feedback:{}", ip_hash), max_attempts, RATE_WINDOW) {
        return fail(
            Status::TooManyRequests,
            "Too many feedback submissions. Please try again later.",
        );
    }

    let errors = validate::validate_feedback(&form);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    let sanitized = FeedbackForm {
        name: validate::sanitize_html(&form.name),
        email: form.email.as_deref().map(|e| e.trim().to_lowercase()),
        rating: form.rating,
        category: form.category.clone(),
        feedback: validate::sanitize_html(&form.feedback),
        is_public: form.is_public,
    };

    match Feedback::create(pool, &sanitized, &client_ip.0, &user_agent.0) {
        Ok(id) => {
            if let Err(e) = SiteStat::increment(pool, "feedback_submissions") {
                log::warn!("failed to bump feedback_submissions: {}", e);
            }
            if let Some(fb) = Feedback::find_by_id(pool, id) {
                email::send_feedback_notification(config, &fb);
            }
            created("Thank you for your feedback!", json!({"id": id}))
        }
        Err(e) => {
            log::error!("failed to store feedback: {}", e);
            fail(
                Status::InternalServerError,
                "Failed to submit feedback. Please try again later.",
            )
        }
    }
}

/// Approved public entries, paginated, optionally filtered by category.
#[get("/public?<page>&<limit>&<category>")]
pub fn public_list(
    pool: &State<DbPool>,
    page: Option<i64>,
    limit: Option<i64>,
    category: Option<&str>,
) -> ApiResult {
    if let Some(c) = category {
        if !FEEDBACK_CATEGORIES.contains(&c) {
            return fail(Status::BadRequest, "Invalid category");
        }
    }

    let limit = validate::clamp(limit, 10, 1, 50);
    let page = page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit;

    let entries = Feedback::public_list(pool, category, limit, offset);
    let total = Feedback::public_count(pool, category);

    ok(json!({
        "feedback": entries,
        "pagination": pagination(page, limit, total),
        "stats": {
            "categories": Feedback::category_stats(pool),
            "average_rating": Feedback::average_rating(pool),
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
    pub approved: Option<bool>,
}

#[patch("/<id>/approve", format = "json", data = "<body>")]
pub fn approve(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    body: Option<Json<ApproveBody>>,
) -> ApiResult {
    let approved = body.and_then(|b| b.approved).unwrap_or(true);
    match Feedback::set_approved(pool, id, approved) {
        Ok(true) => ok_message(if approved {
            "Feedback approved"
        } else {
            "Feedback unapproved"
        }),
        Ok(false) => fail(Status::NotFound, "Feedback not found"),
        Err(e) => {
            log::error!("failed to update feedback {}: {}", id, e);
            fail(Status::InternalServerError, "Failed to update feedback")
        }
    }
}

#[delete("/<id>")]
pub fn delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> ApiResult {
    match Feedback::delete(pool, id) {
        Ok(true) => ok_message("Feedback deleted"),
        Ok(false) => fail(Status::NotFound, "Feedback not found"),
        Err(e) => {
            log::error!("failed to delete feedback {}: {}", id, e);
            fail(Status::InternalServerError, "Failed to delete feedback")
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![submit, public_list, approve, delete]
}
