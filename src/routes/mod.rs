use rocket::http::Status;
use rocket::serde::json::Json;
use serde_json::{json, Value};

use crate::validate::FieldError;

pub mod admin;
pub mod analytics;
pub mod contact;
pub mod feedback;
pub mod projects;
pub mod status;
pub mod visitors;

/// Every API handler returns the same JSON envelope:
/// `{"success": true, "data": ...}` or `{"success": false, "message": ...}`.
pub type ApiResult = (Status, Json<Value>);

pub fn ok(data: Value) -> ApiResult {
    (Status::Ok, Json(json!({"success": true, "data": data})))
}

pub fn ok_message(message: &str) -> ApiResult {
    (Status::Ok, Json(json!({"success": true, "message": message})))
}

pub fn created(message: &str, data: Value) -> ApiResult {
    (
        Status::Created,
        Json(json!({"success": true, "message": message, "data": data})),
    )
}

pub fn fail(status: Status, message: &str) -> ApiResult {
    (status, Json(json!({"success": false, "message": message})))
}

pub fn validation_failure(errors: Vec<FieldError>) -> ApiResult {
    (
        Status::BadRequest,
        Json(json!({
            "success": false,
            "message": "Validation failed",
            "errors": errors,
        })),
    )
}

pub fn pagination(page: i64, limit: i64, total: i64) -> Value {
    let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
    json!({
        "page": page,
        "limit": limit,
        "total": total,
        "pages": pages,
    })
}
