#![cfg(test)]

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth;
use crate::db::{run_migrations, seed_defaults, DbPool};
use crate::models::admin::{Admin, Session};
use crate::models::contact::{ContactForm, ContactMessage};
use crate::models::feedback::{Feedback, FeedbackForm};
use crate::models::page_view::{PageView, StatsPeriod};
use crate::models::project::{Project, ProjectFilter, ProjectForm};
use crate::models::settings::Setting;
use crate::models::site_stats::SiteStat;
use crate::models::visitor::{Visitor, VisitorHit};
use crate::rate_limit::RateLimiter;
use crate::user_agent;
use crate::validate;

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Create a fresh in-memory SQLite pool with migrations + seed defaults applied.
/// Uses a named shared-cache in-memory DB so multiple connections see the same data.
/// Pre-inserts the admin row with a fast bcrypt hash so seed_defaults skips the
/// expensive DEFAULT_COST hash (which can take 60s+ in debug builds).
fn test_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:testdb_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    }
    run_migrations(&pool).expect("Failed to run migrations");
    {
        let conn = pool.get().unwrap();
        let fast = fast_hash("admin123456");
        conn.execute(
            "INSERT INTO admins (username, email, password_hash) VALUES ('admin', 'admin@test.local', ?1)",
            rusqlite::params![fast],
        )
        .unwrap();
    }
    seed_defaults(&pool, "admin@test.local", "admin123456").expect("Failed to seed defaults");
    pool
}

/// Fast bcrypt hash for tests (cost=4 instead of DEFAULT_COST=12).
fn fast_hash(password: &str) -> String {
    bcrypt::hash(password, 4).unwrap()
}

fn device() -> crate::user_agent::DeviceInfo {
    crate::user_agent::DeviceInfo {
        device_type: "desktop".to_string(),
        browser: "Chrome".to_string(),
        os: "Linux".to_string(),
    }
}

// ═══════════════════════════════════════════════════════════
// Settings and site stats
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_set_and_get() {
    let pool = test_pool();
    Setting::set(&pool, "test_key", "hello").unwrap();
    assert_eq!(Setting::get(&pool, "test_key"), Some("hello".to_string()));
}

#[test]
fn settings_upsert() {
    let pool = test_pool();
    Setting::set(&pool, "key", "first").unwrap();
    Setting::set(&pool, "key", "second").unwrap();
    assert_eq!(Setting::get(&pool, "key"), Some("second".to_string()));
}

#[test]
fn settings_typed_getters() {
    let pool = test_pool();
    Setting::set(&pool, "num", "42").unwrap();
    assert_eq!(Setting::get_i64(&pool, "num"), 42);
    assert_eq!(Setting::get_i64(&pool, "missing"), 0);
    assert_eq!(Setting::get_or(&pool, "missing", "fallback"), "fallback");
    assert!(Setting::get_bool(&pool, "enable_visitor_tracking"));
    assert!(!Setting::get_bool(&pool, "missing_flag"));
}

#[test]
fn seeded_rate_limits() {
    let pool = test_pool();
    assert_eq!(Setting::get_i64(&pool, "login_rate_limit"), 5);
    assert_eq!(Setting::get_i64(&pool, "contact_rate_limit"), 5);
    assert_eq!(Setting::get_i64(&pool, "feedback_rate_limit"), 5);
}

#[test]
fn site_stats_increment() {
    let pool = test_pool();
    assert_eq!(SiteStat::get(&pool, "page_views"), 0);
    SiteStat::increment(&pool, "page_views").unwrap();
    SiteStat::increment(&pool, "page_views").unwrap();
    assert_eq!(SiteStat::get(&pool, "page_views"), 2);

    let all = SiteStat::all(&pool);
    assert_eq!(all.get("page_views"), Some(&2));
    assert_eq!(all.get("contact_submissions"), Some(&0));
}

// ═══════════════════════════════════════════════════════════
// Contact messages
// ═══════════════════════════════════════════════════════════

fn contact_form(subject: &str) -> ContactForm {
    ContactForm {
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        subject: subject.to_string(),
        message: "This is a sufficiently long test message.".to_string(),
    }
}

#[test]
fn contact_crud() {
    let pool = test_pool();

    let id = ContactMessage::create(&pool, &contact_form("Hello there"), "1.2.3.4", "test-agent")
        .unwrap();
    let msg = ContactMessage::find_by_id(&pool, id).unwrap();
    assert_eq!(msg.subject, "Hello there");
    assert_eq!(msg.status, "new");
    assert_eq!(msg.ip_address.as_deref(), Some("1.2.3.4"));

    assert!(ContactMessage::update_status(&pool, id, "read").unwrap());
    let msg = ContactMessage::find_by_id(&pool, id).unwrap();
    assert_eq!(msg.status, "read");

    assert!(ContactMessage::delete(&pool, id).unwrap());
    assert!(ContactMessage::find_by_id(&pool, id).is_none());
}

#[test]
fn contact_list_filters_by_status() {
    let pool = test_pool();
    let a = ContactMessage::create(&pool, &contact_form("First one"), "1.1.1.1", "ua").unwrap();
    let _b = ContactMessage::create(&pool, &contact_form("Second one"), "1.1.1.1", "ua").unwrap();
    ContactMessage::update_status(&pool, a, "replied").unwrap();

    assert_eq!(ContactMessage::count(&pool, None), 2);
    assert_eq!(ContactMessage::count(&pool, Some("new")), 1);
    assert_eq!(ContactMessage::count(&pool, Some("replied")), 1);

    let replied = ContactMessage::list(&pool, Some("replied"), 10, 0);
    assert_eq!(replied.len(), 1);
    assert_eq!(replied[0].id, a);

    assert_eq!(ContactMessage::recent_count(&pool, 7), 2);
}

#[test]
fn contact_update_missing_row() {
    let pool = test_pool();
    assert!(!ContactMessage::update_status(&pool, 9999, "read").unwrap());
    assert!(!ContactMessage::delete(&pool, 9999).unwrap());
}

#[test]
fn contact_validation() {
    let valid = contact_form("A valid subject");
    assert!(validate::validate_contact(&valid).is_empty());

    let bad = ContactForm {
        name: "J".to_string(),
        email: "not-an-email".to_string(),
        subject: "hi".to_string(),
        message: "short".to_string(),
    };
    let errors = validate::validate_contact(&bad);
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"subject"));
    assert!(fields.contains(&"message"));
}

#[test]
fn contact_name_rejects_digits() {
    let mut form = contact_form("A valid subject");
    form.name = "Jane123".to_string();
    let errors = validate::validate_contact(&form);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "name");

    form.name = "Mary-Jane O'Brien".to_string();
    assert!(validate::validate_contact(&form).is_empty());
}

// ═══════════════════════════════════════════════════════════
// Feedback
// ═══════════════════════════════════════════════════════════

fn feedback_form(rating: i64, category: &str, is_public: bool) -> FeedbackForm {
    FeedbackForm {
        name: "Sam Reviewer".to_string(),
        email: Some("sam@example.com".to_string()),
        rating,
        category: category.to_string(),
        feedback: "Really enjoyed browsing the projects page.".to_string(),
        is_public,
    }
}

#[test]
fn feedback_approval_flow() {
    let pool = test_pool();
    let id = Feedback::create(&pool, &feedback_form(5, "design", true), "1.2.3.4", "ua").unwrap();

    // Not approved yet, so not public
    assert!(Feedback::public_list(&pool, None, 10, 0).is_empty());
    assert_eq!(Feedback::public_count(&pool, None), 0);

    assert!(Feedback::set_approved(&pool, id, true).unwrap());
    let public = Feedback::public_list(&pool, None, 10, 0);
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].rating, 5);

    // Approved but not public still stays hidden
    let private_id =
        Feedback::create(&pool, &feedback_form(3, "content", false), "1.2.3.4", "ua").unwrap();
    Feedback::set_approved(&pool, private_id, true).unwrap();
    assert_eq!(Feedback::public_count(&pool, None), 1);

    // Unapprove hides it again
    Feedback::set_approved(&pool, id, false).unwrap();
    assert_eq!(Feedback::public_count(&pool, None), 0);
}

#[test]
fn feedback_public_projection_hides_email() {
    let pool = test_pool();
    let id = Feedback::create(&pool, &feedback_form(4, "overall", true), "9.9.9.9", "ua").unwrap();
    Feedback::set_approved(&pool, id, true).unwrap();

    let json = serde_json::to_value(&Feedback::public_list(&pool, None, 10, 0)[0]).unwrap();
    assert!(json.get("email").is_none());
    assert!(json.get("ip_address").is_none());
}

#[test]
fn feedback_category_filter_and_stats() {
    let pool = test_pool();
    for (rating, category) in [(5, "design"), (3, "design"), (4, "content")] {
        let id = Feedback::create(&pool, &feedback_form(rating, category, true), "ip", "ua")
            .unwrap();
        Feedback::set_approved(&pool, id, true).unwrap();
    }

    assert_eq!(Feedback::public_count(&pool, Some("design")), 2);
    assert_eq!(Feedback::public_count(&pool, Some("content")), 1);
    assert_eq!(Feedback::public_count(&pool, Some("functionality")), 0);

    let stats = Feedback::category_stats(&pool);
    let design = stats.iter().find(|s| s.category == "design").unwrap();
    assert_eq!(design.count, 2);
    assert!((design.avg_rating - 4.0).abs() < f64::EPSILON);

    assert!((Feedback::average_rating(&pool) - 4.0).abs() < f64::EPSILON);
}

#[test]
fn feedback_validation() {
    assert!(validate::validate_feedback(&feedback_form(3, "overall", false)).is_empty());

    let errors = validate::validate_feedback(&feedback_form(6, "nonsense", false));
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"rating"));
    assert!(fields.contains(&"category"));

    let mut short = feedback_form(3, "overall", false);
    short.feedback = "meh".to_string();
    assert_eq!(validate::validate_feedback(&short)[0].field, "feedback");
}

// ═══════════════════════════════════════════════════════════
// Projects
// ═══════════════════════════════════════════════════════════

fn project_form(title: &str, category: &str, featured: bool) -> ProjectForm {
    ProjectForm {
        title: title.to_string(),
        description: "A longer description of what this project does.".to_string(),
        short_description: None,
        image_url: None,
        demo_url: Some("https://example.com/demo".to_string()),
        github_url: None,
        technologies: vec!["Rust".to_string(), "SQLite".to_string()],
        category: category.to_string(),
        status: Some("completed".to_string()),
        featured: Some(featured),
        sort_order: Some(0),
    }
}

#[test]
fn project_crud_and_technologies_roundtrip() {
    let pool = test_pool();
    let id = Project::create(&pool, &project_form("CLI Tool", "other", false)).unwrap();

    let project = Project::find_by_id(&pool, id).unwrap();
    assert_eq!(project.title, "CLI Tool");
    assert_eq!(project.technologies, vec!["Rust", "SQLite"]);
    assert!(!project.featured);

    let mut form = project_form("CLI Tool v2", "other", true);
    form.technologies.push("Rocket".to_string());
    assert!(Project::update(&pool, id, &form).unwrap());
    let project = Project::find_by_id(&pool, id).unwrap();
    assert_eq!(project.title, "CLI Tool v2");
    assert_eq!(project.technologies.len(), 3);
    assert!(project.featured);

    assert!(Project::delete(&pool, id).unwrap());
    assert!(Project::find_by_id(&pool, id).is_none());
    assert!(!Project::update(&pool, id, &form).unwrap());
}

#[test]
fn project_list_filters() {
    let pool = test_pool();
    // Two seeded web projects exist already
    Project::create(&pool, &project_form("API Service", "api", true)).unwrap();
    let mut planned = project_form("Mobile App", "mobile", false);
    planned.status = Some("planned".to_string());
    Project::create(&pool, &planned).unwrap();

    let all = ProjectFilter::default();
    assert_eq!(Project::count(&pool, &all), 4);

    let api_only = ProjectFilter {
        category: Some("api"),
        ..Default::default()
    };
    assert_eq!(Project::count(&pool, &api_only), 1);

    let completed = ProjectFilter {
        status: Some("completed"),
        ..Default::default()
    };
    assert_eq!(Project::count(&pool, &completed), 3);

    let featured = ProjectFilter {
        featured: Some(true),
        ..Default::default()
    };
    let listed = Project::list(&pool, &featured, 10, 0);
    assert_eq!(listed.len(), 3);
    // Featured rows sort before everything else
    assert!(listed.iter().all(|p| p.featured));
}

#[test]
fn project_featured_list_excludes_unfinished() {
    let pool = test_pool();
    let mut wip = project_form("WIP Thing", "web", true);
    wip.status = Some("in-progress".to_string());
    Project::create(&pool, &wip).unwrap();

    let featured = Project::featured_list(&pool, 10);
    assert!(featured.iter().all(|p| p.status == "completed" && p.featured));
}

#[test]
fn project_stats() {
    let pool = test_pool();
    Project::create(&pool, &project_form("API Service", "api", false)).unwrap();

    let overall = Project::overall_stats(&pool);
    assert_eq!(overall.total_projects, 3);
    assert_eq!(overall.completed_projects, 3);
    assert_eq!(overall.featured_projects, 2);

    let by_category = Project::category_stats(&pool);
    let web = by_category.iter().find(|s| s.category == "web").unwrap();
    assert_eq!(web.total_projects, 2);
}

#[test]
fn project_validation() {
    assert!(validate::validate_project(&project_form("Good", "web", false)).is_empty());

    let mut bad = project_form("Bad", "nope", false);
    bad.technologies.clear();
    bad.demo_url = Some("not a url".to_string());
    let errors = validate::validate_project(&bad);
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"category"));
    assert!(fields.contains(&"technologies"));
    assert!(fields.contains(&"demo_url"));
}

// ═══════════════════════════════════════════════════════════
// Visitor tracking
// ═══════════════════════════════════════════════════════════

fn hit<'a>(session_id: &'a str, page: &'a str) -> VisitorHit<'a> {
    VisitorHit {
        session_id,
        page,
        referrer: "",
        ip: "10.0.0.1",
        user_agent: "test-agent",
        device: device(),
    }
}

#[test]
fn visitor_dedup_per_session_per_day() {
    let pool = test_pool();

    let first = Visitor::track(&pool, &hit("sess-a", "/")).unwrap();
    assert!(first.is_new_visitor);
    assert!(first.is_new_session);

    let second = Visitor::track(&pool, &hit("sess-a", "/projects")).unwrap();
    assert!(!second.is_new_visitor);
    assert!(!second.is_new_session);

    let other = Visitor::track(&pool, &hit("sess-b", "/")).unwrap();
    assert!(other.is_new_session);

    let stats = Visitor::stats(&pool);
    assert_eq!(stats.total_visitors, 3);
    assert_eq!(stats.unique_visitors, 2);
    assert_eq!(stats.page_views, 3);
    assert_eq!(stats.today_views, 3);
    assert_eq!(stats.today_unique, 2);
}

#[test]
fn visitor_analytics_aggregates() {
    let pool = test_pool();
    Visitor::track(&pool, &hit("sess-a", "/")).unwrap();
    Visitor::track(&pool, &hit("sess-a", "/")).unwrap();
    Visitor::track(&pool, &hit("sess-b", "/projects")).unwrap();

    let analytics = Visitor::analytics(&pool, 30);
    assert_eq!(analytics.timeframe, 30);
    assert_eq!(analytics.daily_stats.len(), 1);
    assert_eq!(analytics.daily_stats[0].page_views, 3);
    assert_eq!(analytics.daily_stats[0].unique_visitors, 2);

    assert_eq!(analytics.top_pages[0].page, "/");
    assert_eq!(analytics.top_pages[0].views, 2);

    let desktop = analytics
        .device_stats
        .iter()
        .find(|s| s.label == "desktop")
        .unwrap();
    assert_eq!(desktop.count, 3);
    assert!((desktop.percentage - 100.0).abs() < 0.01);

    // Empty referrers bucket as Direct
    assert_eq!(analytics.referrer_stats[0].source, "Direct");
}

// ═══════════════════════════════════════════════════════════
// Page view analytics
// ═══════════════════════════════════════════════════════════

#[test]
fn page_view_record_updates_sessions_and_popular() {
    let pool = test_pool();
    let d = device();
    PageView::record(&pool, "/", "session-token-1", None, "10.0.0.1", "ua", &d).unwrap();
    PageView::record(&pool, "/", "session-token-1", None, "10.0.0.1", "ua", &d).unwrap();
    PageView::record(&pool, "/", "session-token-2", None, "10.0.0.2", "ua", &d).unwrap();

    let popular = PageView::popular(&pool, 10);
    assert_eq!(popular.len(), 1);
    assert_eq!(popular[0].view_count, 3);
    // Same IP twice counts once, second IP counts again
    assert_eq!(popular[0].unique_visitors, 2);

    let conn = pool.get().unwrap();
    let (count, pages): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), SUM(page_count) FROM user_sessions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(pages, 3);
}

#[test]
fn page_view_summary_and_realtime() {
    let pool = test_pool();
    let d = device();
    PageView::record(&pool, "/", "session-token-1", Some("https://google.com"), "1.1.1.1", "ua", &d)
        .unwrap();
    PageView::record(&pool, "/about", "session-token-1", None, "1.1.1.1", "ua", &d).unwrap();

    let summary = PageView::summary(&pool, 30).unwrap();
    assert_eq!(summary.total_views, 2);
    assert_eq!(summary.unique_visitors, 1);
    assert_eq!(summary.daily_views.len(), 1);
    assert_eq!(summary.referrers.len(), 1);

    let realtime = PageView::realtime(&pool).unwrap();
    assert_eq!(realtime.active_sessions, 1);
    assert_eq!(realtime.recent_views, 2);
    assert!(!realtime.hourly_views.is_empty());
}

#[test]
fn page_view_device_stats_percentages() {
    let pool = test_pool();
    let desktop = device();
    let mobile = crate::user_agent::DeviceInfo {
        device_type: "mobile".to_string(),
        browser: "Safari".to_string(),
        os: "iOS".to_string(),
    };
    PageView::record(&pool, "/", "session-token-1", None, "1.1.1.1", "ua", &desktop).unwrap();
    PageView::record(&pool, "/", "session-token-2", None, "2.2.2.2", "ua", &mobile).unwrap();
    PageView::record(&pool, "/", "session-token-3", None, "3.3.3.3", "ua", &mobile).unwrap();

    let stats = PageView::device_stats(&pool).unwrap();
    let mobile_row = stats.devices.iter().find(|e| e.label == "mobile").unwrap();
    assert_eq!(mobile_row.count, 2);
    assert!((mobile_row.percentage - 66.67).abs() < 0.01);
}

#[test]
fn page_view_cleanup_removes_old_rows() {
    let pool = test_pool();
    let d = device();
    PageView::record(&pool, "/", "session-token-1", None, "1.1.1.1", "ua", &d).unwrap();
    {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO page_views (page_url, session_id, ip_address, created_at)
             VALUES ('/old', 'session-token-9', '9.9.9.9', datetime('now', '-120 days'))",
            [],
        )
        .unwrap();
    }

    let deleted = PageView::cleanup(&pool, 90).unwrap();
    assert_eq!(deleted, 1);

    let rows = PageView::export(&pool, 365);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].page_url, "/");
}

#[test]
fn stats_period_parse() {
    assert_eq!(StatsPeriod::parse("today"), Some(StatsPeriod::Today));
    assert_eq!(StatsPeriod::parse("year"), Some(StatsPeriod::Year));
    assert_eq!(StatsPeriod::parse("decade"), None);

    let pool = test_pool();
    let d = device();
    PageView::record(&pool, "/", "session-token-1", None, "1.1.1.1", "ua", &d).unwrap();
    let today = PageView::visitor_stats(&pool, StatsPeriod::Today);
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].page_views, 1);
}

// ═══════════════════════════════════════════════════════════
// Admin auth and sessions
// ═══════════════════════════════════════════════════════════

#[test]
fn seeded_admin_exists() {
    let pool = test_pool();
    let admin = Admin::find_by_username(&pool, "admin").unwrap();
    assert!(admin.is_active);
    assert!(auth::verify_password("admin123456", &admin.password_hash));
    assert!(!auth::verify_password("wrong", &admin.password_hash));
}

#[test]
fn session_lifecycle() {
    let pool = test_pool();
    let admin = Admin::find_by_username(&pool, "admin").unwrap();

    Session::create(&pool, admin.id, "tok-valid", "2099-01-01 00:00:00", Some("1.1.1.1"), None)
        .unwrap();
    let resolved = Session::admin_for_token(&pool, "tok-valid").unwrap();
    assert_eq!(resolved.id, admin.id);

    assert!(Session::admin_for_token(&pool, "tok-unknown").is_none());

    Session::delete(&pool, "tok-valid").unwrap();
    assert!(Session::admin_for_token(&pool, "tok-valid").is_none());
}

#[test]
fn expired_sessions_rejected_and_cleaned() {
    let pool = test_pool();
    let admin = Admin::find_by_username(&pool, "admin").unwrap();

    Session::create(&pool, admin.id, "tok-old", "2000-01-01 00:00:00", None, None).unwrap();
    assert!(Session::admin_for_token(&pool, "tok-old").is_none());

    assert_eq!(Session::cleanup_expired(&pool), 1);
}

#[test]
fn touch_last_login() {
    let pool = test_pool();
    let admin = Admin::find_by_username(&pool, "admin").unwrap();
    assert!(admin.last_login.is_none());

    Admin::touch_last_login(&pool, admin.id).unwrap();
    let admin = Admin::find_by_id(&pool, admin.id).unwrap();
    assert!(admin.last_login.is_some());
}

#[test]
fn login_validation() {
    assert!(validate::validate_login("admin", "admin123456").is_empty());

    let errors = validate::validate_login("   ", "abc");
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"password"));

    // Exactly six characters passes the length rule
    assert!(validate::validate_login("admin", "abcdef").is_empty());
}

#[test]
fn login_lockout_after_failed_attempts() {
    let pool = test_pool();
    let limiter = RateLimiter::new();
    let window = std::time::Duration::from_secs(15 * 60);
    let max = Setting::get_i64(&pool, "login_rate_limit").max(1) as u64;
    let key = format!("login:{}", auth::hash_ip("203.0.113.9"));

    let admin = Admin::find_by_username(&pool, "admin").unwrap();
    for _ in 0..max {
        assert!(limiter.check_and_record(&key, max, window));
        assert!(!auth::verify_password("wrong-password", &admin.password_hash));
    }

    // The next attempt is refused before credentials are even checked
    assert!(!limiter.check_and_record(&key, max, window));
    assert!(limiter.retry_after(&key, window) > 0);

    // Other IPs are unaffected
    let other = format!("login:{}", auth::hash_ip("203.0.113.10"));
    assert!(limiter.check_and_record(&other, max, window));
}

#[test]
fn hash_ip_is_deterministic() {
    let a = auth::hash_ip("203.0.113.7");
    let b = auth::hash_ip("203.0.113.7");
    let c = auth::hash_ip("203.0.113.8");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 64);
}

// ═══════════════════════════════════════════════════════════
// Rate limiting
// ═══════════════════════════════════════════════════════════

#[test]
fn rate_limiter_blocks_after_max() {
    let limiter = RateLimiter::new();
    let window = std::time::Duration::from_secs(60);

    for _ in 0..3 {
        assert!(limiter.check_and_record("login:abc", 3, window));
    }
    assert!(!limiter.check_and_record("login:abc", 3, window));
    assert_eq!(limiter.remaining("login:abc", 3, window), 0);
    assert!(limiter.retry_after("login:abc", window) > 0);

    // Separate keys have separate budgets
    assert!(limiter.check_and_record("login:def", 3, window));
}

#[test]
fn rate_limiter_cleanup() {
    let limiter = RateLimiter::new();
    limiter.check_and_record("k", 5, std::time::Duration::from_secs(60));
    limiter.cleanup(std::time::Duration::from_secs(0));
    assert_eq!(limiter.remaining("k", 5, std::time::Duration::from_secs(60)), 5);
}

// ═══════════════════════════════════════════════════════════
// User-agent parsing and sanitization
// ═══════════════════════════════════════════════════════════

#[test]
fn user_agent_desktop_chrome() {
    let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    let info = user_agent::parse(ua);
    assert_eq!(info.device_type, "desktop");
    assert_eq!(info.browser, "Chrome");
    assert_eq!(info.os, "Windows");
}

#[test]
fn user_agent_iphone_safari() {
    let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    let info = user_agent::parse(ua);
    assert_eq!(info.device_type, "mobile");
    assert_eq!(info.browser, "Safari");
    assert_eq!(info.os, "iOS");
}

#[test]
fn user_agent_unknown() {
    let info = user_agent::parse("curl/8.4.0");
    assert_eq!(info.device_type, "desktop");
    assert_eq!(info.browser, "Unknown");
}

#[test]
fn sanitize_strips_scripts() {
    let dirty = "hello <script>alert('x')</script>world";
    assert_eq!(validate::sanitize_html(dirty), "hello world");

    let handler = "a onclick= b javascript:void(0)";
    let clean = validate::sanitize_html(handler);
    assert!(!clean.contains("onclick"));
    assert!(!clean.contains("javascript:"));
}

#[test]
fn clamp_ranges() {
    assert_eq!(validate::clamp(None, 10, 1, 50), 10);
    assert_eq!(validate::clamp(Some(500), 10, 1, 50), 50);
    assert_eq!(validate::clamp(Some(-3), 10, 1, 50), 1);
}

#[test]
fn upload_limit_follows_config() {
    let config = crate::config::Config::from_env();
    let figment = crate::rocket_figment(&config);
    let limits: rocket::data::Limits = figment.extract_inner("limits").unwrap();
    assert_eq!(
        limits.get("file"),
        Some(rocket::data::ByteUnit::Byte(config.max_upload_bytes))
    );
    // Multipart framing headroom on top of the file cap
    assert!(limits.get("data-form").unwrap() > limits.get("file").unwrap());
}

#[test]
fn email_validation() {
    assert!(validate::is_valid_email("user@example.com"));
    assert!(!validate::is_valid_email("user@@example.com"));
    assert!(!validate::is_valid_email("no-at-sign"));
}
