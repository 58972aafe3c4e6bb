use chrono::{Duration, Utc};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::db::DbPool;
use crate::models::admin::{Admin, Session};

// ── Client IP request guard ──

/// Extracts the real client IP from the request.
/// Checks headers in priority order:
///   1. CF-Connecting-IP (Cloudflare)
///   2. True-Client-IP (Cloudflare Enterprise / Akamai)
///   3. X-Real-IP (nginx proxy_set_header)
///   4. X-Forwarded-For (first IP in the chain = original client)
///   5. Rocket's client_ip() (socket peer address)
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let headers = request.headers();

        for header in ["CF-Connecting-IP", "True-Client-IP", "X-Real-IP"] {
            if let Some(ip) = headers.get_one(header) {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Outcome::Success(ClientIp(ip.to_string()));
                }
            }
        }

        // X-Forwarded-For: client, proxy1, proxy2 — take the first (leftmost)
        if let Some(forwarded) = headers.get_one("X-Forwarded-For") {
            if let Some(ip) = forwarded.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Outcome::Success(ClientIp(ip.to_string()));
                }
            }
        }

        let ip = request
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

/// Raw User-Agent header, empty string when absent.
pub struct UserAgent(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserAgent {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let ua = request.headers().get_one("User-Agent").unwrap_or("");
        Outcome::Success(UserAgent(ua.to_string()))
    }
}

// ── Admin bearer-token guard ──

/// Guard: requires a valid, unexpired session token in either the
/// `Authorization: Bearer <token>` or `x-auth-token` header.
pub struct AdminUser {
    pub admin: Admin,
    pub token: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let pool = match request.guard::<&State<DbPool>>().await.succeeded() {
            Some(p) => p,
            None => return Outcome::Error((Status::InternalServerError, ())),
        };

        let token = match bearer_token(request) {
            Some(t) => t,
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        match Session::admin_for_token(pool, &token) {
            Some(admin) => Outcome::Success(AdminUser { admin, token }),
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

fn bearer_token(request: &Request<'_>) -> Option<String> {
    let headers = request.headers();

    if let Some(auth) = headers.get_one("Authorization") {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_one("x-auth-token")
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

// ── Password utilities ──

pub fn hash_password(password: &str) -> Result<String, String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| e.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

// ── Session management ──

/// Create an opaque session token for a freshly authenticated admin.
pub fn create_session(
    pool: &DbPool,
    config: &Config,
    admin_id: i64,
    ip: Option<&str>,
    ua: Option<&str>,
) -> Result<String, String> {
    let token = uuid::Uuid::new_v4().to_string();
    let expires = Utc::now().naive_utc() + Duration::hours(config.session_expiry_hours.max(1));
    let expires_str = expires.format("%Y-%m-%d %H:%M:%S").to_string();

    Session::create(pool, admin_id, &token, &expires_str, ip, ua)?;

    Ok(token)
}

pub fn destroy_session(pool: &DbPool, token: &str) -> Result<(), String> {
    Session::delete(pool, token)
}

pub fn hash_ip(ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hex::encode(hasher.finalize())
}
