use std::env;

/// Application configuration, read once from the environment at boot and
/// shared via Rocket managed state.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub static_dir: String,
    pub uploads_dir: String,
    pub logs_dir: String,
    pub allowed_origins: Vec<String>,

    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub email_from: String,
    /// Where contact/feedback notifications are delivered. Emails are
    /// skipped entirely when this is unset.
    pub notification_email: Option<String>,

    /// Password the default admin account is seeded with on first boot.
    pub admin_password: String,
    pub admin_email: String,

    pub session_expiry_hours: i64,
    pub analytics_retention_days: i64,
    pub log_retention_days: i64,
    pub max_upload_bytes: u64,
}

/// Env vars the boot check warns about when missing. None are fatal — the
/// affected feature (email) degrades to log-and-skip.
pub const RECOMMENDED_VARS: &[&str] = &["SMTP_USER", "SMTP_PASS", "NOTIFICATION_EMAIL"];

impl Config {
    pub fn from_env() -> Self {
        Config {
            database_path: env_or("DATABASE_PATH", "data/portfolio.db"),
            static_dir: env_or("STATIC_DIR", "build"),
            uploads_dir: env_or("UPLOADS_DIR", "uploads"),
            logs_dir: env_or("LOGS_DIR", "logs"),
            allowed_origins: env_or("ALLOWED_ORIGINS", "http://localhost:3000,http://127.0.0.1:3000")
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),

            smtp_host: env_or("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            smtp_user: env_nonempty("SMTP_USER"),
            smtp_pass: env_nonempty("SMTP_PASS"),
            email_from: env_or("EMAIL_FROM", "noreply@portfolio.local"),
            notification_email: env_nonempty("NOTIFICATION_EMAIL"),

            admin_password: env_or("ADMIN_PASSWORD", "admin123456"),
            admin_email: env_or("ADMIN_EMAIL", "admin@portfolio.local"),

            session_expiry_hours: env_i64("SESSION_EXPIRY_HOURS", 24),
            analytics_retention_days: env_i64("ANALYTICS_RETENTION_DAYS", 90),
            log_retention_days: env_i64("LOG_RETENTION_DAYS", 30),
            max_upload_bytes: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5 * 1024 * 1024),
        }
    }

    pub fn email_configured(&self) -> bool {
        self.smtp_user.is_some() && self.smtp_pass.is_some() && self.notification_email.is_some()
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_nonempty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
