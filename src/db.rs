use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool(path: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Contact form submissions
        CREATE TABLE IF NOT EXISTS contact_messages (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            subject TEXT NOT NULL,
            message TEXT NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            status TEXT NOT NULL DEFAULT 'new' CHECK(status IN ('new', 'read', 'replied')),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Visitor feedback (shown publicly once approved)
        CREATE TABLE IF NOT EXISTS feedback (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            rating INTEGER NOT NULL CHECK(rating BETWEEN 1 AND 5),
            category TEXT NOT NULL CHECK(category IN ('design', 'functionality', 'content', 'overall')),
            feedback TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 0,
            is_approved INTEGER NOT NULL DEFAULT 0,
            ip_address TEXT,
            user_agent TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Project catalog
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            short_description TEXT,
            image_url TEXT,
            demo_url TEXT,
            github_url TEXT,
            technologies TEXT NOT NULL DEFAULT '[]',
            category TEXT NOT NULL CHECK(category IN ('web', 'mobile', 'desktop', 'api', 'other')),
            status TEXT NOT NULL DEFAULT 'completed' CHECK(status IN ('completed', 'in-progress', 'planned')),
            featured INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Visitor tracking beacons (one row per tracked page hit)
        CREATE TABLE IF NOT EXISTS visitors (
            id INTEGER PRIMARY KEY,
            session_id TEXT NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            page TEXT NOT NULL,
            referrer TEXT,
            device_type TEXT,
            browser TEXT,
            os TEXT,
            visit_date DATE NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Analytics page views
        CREATE TABLE IF NOT EXISTS page_views (
            id INTEGER PRIMARY KEY,
            page_url TEXT NOT NULL,
            session_id TEXT,
            ip_address TEXT,
            user_agent TEXT,
            referrer TEXT,
            device_type TEXT,
            browser TEXT,
            os TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Analytics browsing sessions
        CREATE TABLE IF NOT EXISTS user_sessions (
            id INTEGER PRIMARY KEY,
            session_id TEXT UNIQUE NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            first_visit DATETIME DEFAULT CURRENT_TIMESTAMP,
            last_activity DATETIME DEFAULT CURRENT_TIMESTAMP,
            page_count INTEGER NOT NULL DEFAULT 1,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        -- Aggregated per-page counters
        CREATE TABLE IF NOT EXISTS popular_pages (
            id INTEGER PRIMARY KEY,
            page_url TEXT UNIQUE NOT NULL,
            view_count INTEGER NOT NULL DEFAULT 0,
            unique_visitors INTEGER NOT NULL DEFAULT 0,
            last_updated DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Admin accounts
        CREATE TABLE IF NOT EXISTS admins (
            id INTEGER PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            full_name TEXT,
            last_login DATETIME,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Admin sessions (bearer tokens)
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            admin_id INTEGER NOT NULL,
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            FOREIGN KEY (admin_id) REFERENCES admins(id)
        );

        -- Site-wide counters
        CREATE TABLE IF NOT EXISTS site_stats (
            stat_name TEXT PRIMARY KEY,
            stat_value INTEGER NOT NULL DEFAULT 0,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_contact_status ON contact_messages(status);
        CREATE INDEX IF NOT EXISTS idx_contact_created ON contact_messages(created_at);
        CREATE INDEX IF NOT EXISTS idx_feedback_approved ON feedback(is_approved);
        CREATE INDEX IF NOT EXISTS idx_feedback_category ON feedback(category);
        CREATE INDEX IF NOT EXISTS idx_projects_category ON projects(category);
        CREATE INDEX IF NOT EXISTS idx_projects_featured ON projects(featured);
        CREATE INDEX IF NOT EXISTS idx_visitors_session ON visitors(session_id);
        CREATE INDEX IF NOT EXISTS idx_visitors_date ON visitors(visit_date);
        CREATE INDEX IF NOT EXISTS idx_views_url ON page_views(page_url);
        CREATE INDEX IF NOT EXISTS idx_views_created ON page_views(created_at);
        CREATE INDEX IF NOT EXISTS idx_sessions_activity ON user_sessions(last_activity);
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(
    pool: &DbPool,
    admin_email: &str,
    admin_password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let counters = [
        "total_visitors",
        "unique_visitors",
        "page_views",
        "contact_submissions",
        "feedback_submissions",
    ];
    for name in counters {
        conn.execute(
            "INSERT OR IGNORE INTO site_stats (stat_name, stat_value) VALUES (?1, 0)",
            params![name],
        )?;
    }

    let defaults = [
        ("site_name", "My Portfolio"),
        ("site_description", "Professional portfolio website"),
        ("enable_visitor_tracking", "true"),
        ("enable_email_notifications", "true"),
        ("login_rate_limit", "5"),
        ("api_rate_limit", "100"),
        ("contact_rate_limit", "5"),
        ("feedback_rate_limit", "5"),
    ];
    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    // Seed the default admin account on first boot
    let admin_count: i64 = conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
    if admin_count == 0 {
        let hash = bcrypt::hash(admin_password, bcrypt::DEFAULT_COST)?;
        conn.execute(
            "INSERT INTO admins (username, email, password_hash, full_name)
             VALUES ('admin', ?1, ?2, 'Portfolio Admin')",
            params![admin_email, hash],
        )?;
        log::warn!("Seeded default admin account — change the password after first login");
    }

    // Seed sample projects so a fresh install has something to render
    let project_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
    if project_count == 0 {
        conn.execute(
            "INSERT INTO projects (title, description, short_description, technologies, category, status, featured, sort_order)
             VALUES (?1, ?2, ?3, ?4, 'web', 'completed', 1, 1)",
            params![
                "Personal Portfolio Website",
                "Modern responsive portfolio with a single-page frontend and an API backend.",
                "Portfolio site",
                r#"["React","Rust","Rocket","SQLite"]"#,
            ],
        )?;
        conn.execute(
            "INSERT INTO projects (title, description, short_description, technologies, category, status, featured, sort_order)
             VALUES (?1, ?2, ?3, ?4, 'web', 'completed', 1, 2)",
            params![
                "E-commerce Platform",
                "Full-stack commerce application with payments and order management.",
                "Full commerce site",
                r#"["React","Node.js","MongoDB","Stripe"]"#,
            ],
        )?;
    }

    Ok(())
}
