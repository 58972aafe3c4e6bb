use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{info, warn};

use crate::config::Config;
use crate::models::contact::ContactMessage;
use crate::models::feedback::Feedback;

/// Notify the site owner that a contact message arrived. Failures are
/// logged and swallowed so the submission itself still succeeds.
pub fn send_contact_notification(config: &Config, msg: &ContactMessage) {
    if !config.email_configured() {
        info!("email not configured, skipping contact notification");
        return;
    }
    let to = match config.notification_email.as_deref() {
        Some(t) => t,
        None => return,
    };

    let body = format!(
        "New contact message received.\n\n\
         From: {} <{}>\n\
         Subject: {}\n\n\
         {}\n\n\
         Received: {}\n",
        msg.name, msg.email, msg.subject, msg.message, msg.created_at
    );
    let subject = format!("New contact message: {}", msg.subject);

    match send_smtp(config, to, &subject, &body) {
        Ok(()) => info!("contact notification sent to {}", to),
        Err(e) => warn!("failed to send contact notification: {}", e),
    }
}

/// Auto-reply to the person who wrote in.
pub fn send_auto_reply(config: &Config, msg: &ContactMessage) {
    if !config.email_configured() {
        return;
    }

    let body = format!(
        "Hi {},\n\n\
         Thanks for reaching out. I received your message about \"{}\" and will \
         get back to you as soon as I can, usually within a couple of days.\n\n\
         Best,\n",
        msg.name, msg.subject
    );

    match send_smtp(config, &msg.email, "Thanks for your message", &body) {
        Ok(()) => info!("auto-reply sent to {}", msg.email),
        Err(e) => warn!("failed to send auto-reply to {}: {}", msg.email, e),
    }
}

/// Notify the site owner that feedback was left.
pub fn send_feedback_notification(config: &Config, fb: &Feedback) {
    if !config.email_configured() {
        return;
    }
    let to = match config.notification_email.as_deref() {
        Some(t) => t,
        None => return,
    };

    let body = format!(
        "New feedback received.\n\n\
         From: {}\n\
         Rating: {}/5\n\
         Category: {}\n\n\
         {}\n",
        fb.name, fb.rating, fb.category, fb.feedback
    );
    let subject = format!("New feedback: {}/5 ({})", fb.rating, fb.category);

    match send_smtp(config, to, &subject, &body) {
        Ok(()) => info!("feedback notification sent to {}", to),
        Err(e) => warn!("failed to send feedback notification: {}", e),
    }
}

fn send_smtp(config: &Config, to: &str, subject: &str, body: &str) -> Result<(), String> {
    let email = Message::builder()
        .from(config.email_from.parse().map_err(|e| format!("Invalid from address: {}", e))?)
        .to(to.parse().map_err(|e| format!("Invalid to address: {}", e))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| format!("Failed to build email: {}", e))?;

    let username = config.smtp_user.clone().unwrap_or_default();
    let password = config.smtp_pass.clone().unwrap_or_default();
    let creds = Credentials::new(username, password);

    let mailer = SmtpTransport::starttls_relay(&config.smtp_host)
        .map_err(|e| format!("SMTP relay error: {}", e))?
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    mailer.send(&email).map_err(|e| format!("SMTP send error: {}", e))?;
    Ok(())
}
