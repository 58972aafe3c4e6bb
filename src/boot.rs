use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::config::{Config, RECOMMENDED_VARS};

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing directories, warns about missing optional config, and
/// aborts if a required directory cannot be created or written.
pub fn run(config: &Config) {
    info!("Boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    let db_dir = Path::new(&config.database_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| Path::new("data").to_path_buf());

    let required = [
        db_dir.as_path(),
        Path::new(&config.uploads_dir),
        Path::new(&config.logs_dir),
    ];
    for dir in required {
        if !dir.exists() {
            match fs::create_dir_all(dir) {
                Ok(_) => info!("  Created directory: {}", dir.display()),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir.display(), e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Database directory writable ──────────────────
    if db_dir.exists() {
        let test_file = db_dir.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                error!("  Database directory not writable: {}", e);
                errors += 1;
            }
        }
    }

    // ── 3. Uploads directory writable ───────────────────
    let uploads = Path::new(&config.uploads_dir);
    if uploads.exists() {
        let test_file = uploads.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                warn!("  Uploads directory not writable: {} (file uploads will fail)", e);
                warnings += 1;
            }
        }
    }

    // ── 4. Static build present ─────────────────────────
    let index = Path::new(&config.static_dir).join("index.html");
    if !index.exists() {
        warn!(
            "  {} not found — the site root will 404 until the frontend build is deployed",
            index.display()
        );
        warnings += 1;
    }

    // ── 5. Recommended env vars ─────────────────────────
    for var in RECOMMENDED_VARS {
        if std::env::var(var).ok().filter(|v| !v.is_empty()).is_none() {
            warn!("  {} not set (email notifications disabled)", var);
            warnings += 1;
        }
    }

    // ── Summary ─────────────────────────────────────────
    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            warnings
        );
    } else {
        info!("Boot check passed. All systems go.");
    }
}
