#[macro_use]
extern crate rocket;

use std::time::Instant;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::{FileServer, Options};
use rocket::http::Header;
use rocket::serde::json::Json;
use serde_json::{json, Value};

mod auth;
mod boot;
mod config;
mod db;
mod email;
mod rate_limit;
mod tasks;
mod user_agent;
mod validate;

mod models;
mod routes;

#[cfg(test)]
mod tests;

use config::Config;
use rate_limit::RateLimiter;
use routes::status::StartTime;

/// Adds CORS headers for origins on the configured allowlist.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        let config = match req.rocket().state::<Config>() {
            Some(c) => c,
            None => return,
        };
        let origin = match req.headers().get_one("Origin") {
            Some(o) => o.to_string(),
            None => return,
        };

        if config.allowed_origins.iter().any(|o| *o == origin) {
            res.set_header(Header::new("Access-Control-Allow-Origin", origin));
            res.set_header(Header::new("Vary", "Origin"));
            res.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
            res.set_header(Header::new(
                "Access-Control-Allow-Methods",
                "GET, POST, PUT, PATCH, DELETE, OPTIONS",
            ));
            res.set_header(Header::new(
                "Access-Control-Allow-Headers",
                "Content-Type, Authorization, x-auth-token",
            ));
        }
    }
}

fn error_body(message: &str) -> Json<Value> {
    Json(json!({"success": false, "message": message}))
}

#[catch(400)]
fn bad_request() -> Json<Value> {
    error_body("Bad request")
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    error_body("Authentication required")
}

#[catch(404)]
fn not_found() -> Json<Value> {
    error_body("Resource not found")
}

#[catch(413)]
fn payload_too_large() -> Json<Value> {
    error_body("Payload too large")
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    error_body("Invalid request body")
}

#[catch(429)]
fn too_many_requests() -> Json<Value> {
    error_body("Too many requests")
}

#[catch(500)]
fn server_error() -> Json<Value> {
    error_body("Internal server error")
}

/// Rocket's built-in data limits (1 MiB files) would reject uploads before
/// the handler's own cap applies, so the configured cap is pushed into the
/// figment. The multipart form gets headroom for the field framing.
fn rocket_figment(config: &Config) -> rocket::figment::Figment {
    rocket::Config::figment()
        .merge(("limits.file", config.max_upload_bytes))
        .merge(("limits.data-form", config.max_upload_bytes + 512 * 1024))
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let config = Config::from_env();

    // Boot check — verify/create directories, warn about missing config
    boot::run(&config);

    let pool = db::init_pool(&config.database_path).expect("Failed to initialize database pool");
    db::run_migrations(&pool).expect("Failed to run database migrations");
    db::seed_defaults(&pool, &config.admin_email, &config.admin_password)
        .expect("Failed to seed defaults");

    let static_dir = config.static_dir.clone();
    let uploads_dir = config.uploads_dir.clone();

    rocket::custom(rocket_figment(&config))
        .manage(pool)
        .manage(config)
        .manage(RateLimiter::new())
        .manage(StartTime(Instant::now()))
        .attach(Cors)
        .attach(tasks::BackgroundTasks)
        .mount("/", FileServer::new(static_dir, Options::Index | Options::Missing).rank(10))
        .mount("/uploads", FileServer::new(uploads_dir, Options::Missing))
        .mount("/", routes::status::root_routes())
        .mount("/api", routes::status::api_routes())
        .mount("/api", routes::admin::upload_routes())
        .mount("/api/contact", routes::contact::routes())
        .mount("/api/feedback", routes::feedback::routes())
        .mount("/api/projects", routes::projects::routes())
        .mount("/api/visitors", routes::visitors::routes())
        .mount("/api/analytics", routes::analytics::routes())
        .mount("/api/admin", routes::admin::routes())
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                not_found,
                payload_too_large,
                unprocessable,
                too_many_requests,
                server_error
            ],
        )
}
