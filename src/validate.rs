use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::models::contact::{ContactForm, CONTACT_STATUSES};
use crate::models::feedback::{FeedbackForm, FEEDBACK_CATEGORIES};
use crate::models::project::{ProjectForm, PROJECT_CATEGORIES, PROJECT_STATUSES};

/// One failed check, reported back to the client per field.
#[derive(Debug, Serialize, Clone)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z\s'\-]+$").unwrap())
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

pub fn is_valid_email(email: &str) -> bool {
    email_re().is_match(email) && email.len() <= 254
}

fn len(s: &str) -> usize {
    s.trim().chars().count()
}

pub fn validate_contact(form: &ContactForm) -> Vec<FieldError> {
    let mut errors = vec![];

    let name_len = len(&form.name);
    if name_len < 2 || name_len > 100 {
        errors.push(FieldError::new("name", "Name must be between 2 and 100 characters"));
    } else if !name_re().is_match(form.name.trim()) {
        errors.push(FieldError::new(
            "name",
            "Name can only contain letters, spaces, hyphens, and apostrophes",
        ));
    }

    if !is_valid_email(form.email.trim()) {
        errors.push(FieldError::new("email", "Please provide a valid email address"));
    }

    let subject_len = len(&form.subject);
    if subject_len < 5 || subject_len > 200 {
        errors.push(FieldError::new(
            "subject",
            "Subject must be between 5 and 200 characters",
        ));
    }

    let message_len = len(&form.message);
    if message_len < 10 || message_len > 2000 {
        errors.push(FieldError::new(
            "message",
            "Message must be between 10 and 2000 characters",
        ));
    }

    errors
}

pub fn validate_feedback(form: &FeedbackForm) -> Vec<FieldError> {
    let mut errors = vec![];

    let name_len = len(&form.name);
    if name_len < 2 || name_len > 100 {
        errors.push(FieldError::new("name", "Name must be between 2 and 100 characters"));
    }

    if let Some(email) = form.email.as_deref() {
        if !email.trim().is_empty() && !is_valid_email(email.trim()) {
            errors.push(FieldError::new("email", "Please provide a valid email address"));
        }
    }

    if !(1..=5).contains(&form.rating) {
        errors.push(FieldError::new("rating", "Rating must be between 1 and 5"));
    }

    if !FEEDBACK_CATEGORIES.contains(&form.category.as_str()) {
        errors.push(FieldError::new(
            "category",
            "Category must be one of: design, functionality, content, overall",
        ));
    }

    let feedback_len = len(&form.feedback);
    if feedback_len < 10 || feedback_len > 1000 {
        errors.push(FieldError::new(
            "feedback",
            "Feedback must be between 10 and 1000 characters",
        ));
    }

    errors
}

pub fn validate_project(form: &ProjectForm) -> Vec<FieldError> {
    let mut errors = vec![];

    let title_len = len(&form.title);
    if title_len < 2 || title_len > 200 {
        errors.push(FieldError::new("title", "Title must be between 2 and 200 characters"));
    }

    let description_len = len(&form.description);
    if description_len < 10 || description_len > 2000 {
        errors.push(FieldError::new(
            "description",
            "Description must be between 10 and 2000 characters",
        ));
    }

    if form.technologies.is_empty() {
        errors.push(FieldError::new(
            "technologies",
            "At least one technology is required",
        ));
    }

    if !PROJECT_CATEGORIES.contains(&form.category.as_str()) {
        errors.push(FieldError::new(
            "category",
            "Category must be one of: web, mobile, desktop, api, other",
        ));
    }

    if let Some(status) = form.status.as_deref() {
        if !PROJECT_STATUSES.contains(&status) {
            errors.push(FieldError::new(
                "status",
                "Status must be one of: completed, in-progress, planned",
            ));
        }
    }

    for (field, value) in [
        ("image_url", &form.image_url),
        ("demo_url", &form.demo_url),
        ("github_url", &form.github_url),
    ] {
        if let Some(u) = value.as_deref() {
            if !u.is_empty() && url::Url::parse(u).is_err() {
                errors.push(FieldError::new(field, "Must be a valid URL"));
            }
        }
    }

    errors
}

pub fn validate_login(username: &str, password: &str) -> Vec<FieldError> {
    let mut errors = vec![];

    if username.trim().is_empty() {
        errors.push(FieldError::new("username", "Username is required"));
    }
    if password.len() < 6 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters",
        ));
    }

    errors
}

pub fn validate_contact_status(status: &str) -> Vec<FieldError> {
    if CONTACT_STATUSES.contains(&status) {
        vec![]
    } else {
        vec![FieldError::new("status", "Status must be one of: new, read, replied")]
    }
}

/// Tracking beacon fields (session_id, page, referrer).
pub fn validate_visit(session_id: &str, page: &str, referrer: &str) -> Vec<FieldError> {
    let mut errors = vec![];

    if session_id.is_empty() || session_id.len() > 100 {
        errors.push(FieldError::new(
            "session_id",
            "Session ID must be between 1 and 100 characters",
        ));
    }
    if page.is_empty() || page.len() > 500 {
        errors.push(FieldError::new("page", "Page must be between 1 and 500 characters"));
    }
    if referrer.len() > 500 {
        errors.push(FieldError::new("referrer", "Referrer must be at most 500 characters"));
    }

    errors
}

/// Page-view beacon session ids are longer random tokens.
pub fn validate_pageview(session_id: &str, page_url: &str) -> Vec<FieldError> {
    let mut errors = vec![];

    if session_id.len() < 10 || session_id.len() > 100 {
        errors.push(FieldError::new(
            "session_id",
            "Session ID must be between 10 and 100 characters",
        ));
    }
    if page_url.is_empty() || page_url.len() > 500 {
        errors.push(FieldError::new(
            "page_url",
            "Page URL must be between 1 and 500 characters",
        ));
    }

    errors
}

/// Strip script tags, inline event handlers, and javascript: URLs from
/// user-supplied text before it is stored or echoed back.
pub fn sanitize_html(input: &str) -> String {
    static SCRIPT_RE: OnceLock<Regex> = OnceLock::new();
    static EVENT_RE: OnceLock<Regex> = OnceLock::new();
    static JS_RE: OnceLock<Regex> = OnceLock::new();

    let script = SCRIPT_RE
        .get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());
    let event = EVENT_RE.get_or_init(|| Regex::new(r"(?i)\bon\w+\s*=").unwrap());
    let js = JS_RE.get_or_init(|| Regex::new(r"(?i)javascript:").unwrap());

    let out = script.replace_all(input.trim(), "");
    let out = event.replace_all(&out, "");
    js.replace_all(&out, "").to_string()
}

/// Clamp a user-supplied integer query parameter into a range.
pub fn clamp(value: Option<i64>, default: i64, min: i64, max: i64) -> i64 {
    value.unwrap_or(default).clamp(min, max)
}
