//! Notification adapters.
//!
//! - `RedisAlertPublisher` - Alerts over Redis pub/sub
//! - `ResendEmailSender` - Templated email via the Resend API
//! - `RecordingAlertPublisher` / `RecordingEmailSender` - In-memory capture

mod recording;
mod redis_alert_publisher;
mod resend_email_sender;

pub use recording::{RecordedAlert, RecordingAlertPublisher, RecordingEmailSender};
pub use redis_alert_publisher::RedisAlertPublisher;
pub use resend_email_sender::{
    render_template, RenderedEmail, ResendEmailSender, DEFAULT_RESEND_BASE_URL,
};
