use std::time::Duration;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::json;

use crate::auth::{self, ClientIp, UserAgent};
use crate::config::Config;
use crate::db::DbPool;
use crate::email;
use crate::models::contact::{ContactForm, ContactMessage};
use crate::models::settings::Setting;
use crate::models::site_stats::SiteStat;
use crate::rate_limit::RateLimiter;
use crate::validate;

use super::{created, fail, validation_failure, ApiResult};

const RATE_WINDOW: Duration = Duration::from_secs(15 * 60);

#[post("/", format = "json", data = "<form>")]
pub fn submit(
    pool: &State<DbPool>,
    config: &State<Config>,
    limiter: &State<RateLimiter>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    form: Json<ContactForm>,
) -> ApiResult {
    let ip_hash = auth::hash_ip(&client_ip.0);
    let max_attempts = Setting::get_i64(pool, "contact_rate_limit").max(1) as u64;
    if !limiter.check_and_record(&format!("contact:{}", ip_hash), max_attempts, RATE_WINDOW) {
        return fail(
            Status::TooManyRequests,
            "Too many contact submissions. Please try again later.",
        );
    }

    let errors = validate::validate_contact(&form);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    let sanitized = ContactForm {
        name: validate::sanitize_html(&form.name),
        email: form.email.trim().to_lowercase(),
        subject: validate::sanitize_html(&form.subject),
        message: validate::sanitize_html(&form.message),
    };

    match ContactMessage::create(pool, &sanitized, &client_ip.0, &user_agent.0) {
        Ok(id) => {
            if let Err(e) = SiteStat::increment(pool, "contact_submissions") {
                log::warn!("failed to bump contact_submissions: {}", e);
            }
            // Notification failures must not fail the submission
            if let Some(msg) = ContactMessage::find_by_id(pool, id) {
                email::send_contact_notification(config, &msg);
                email::send_auto_reply(config, &msg);
                created(
                    "Thank you for your message! I will get back to you soon.",
                    json!({"id": id, "timestamp": msg.created_at}),
                )
            } else {
                created(
                    "Thank you for your message! I will get back to you soon.",
                    json!({"id": id}),
                )
            }
        }
        Err(e) => {
            log::error!("failed to store contact message: {}", e);
            fail(
                Status::InternalServerError,
                "Failed to send message. Please try again later.",
            )
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![submit]
}
