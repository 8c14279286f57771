//! Resend-backed email sender.
//!
//! Renders the known transactional templates locally and posts the result
//! to the Resend HTTP API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{EmailSender, TemplatedEmail, SUBSCRIPTION_CONFIRMATION_TEMPLATE};

pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

/// Resend implementation of the EmailSender port.
pub struct ResendEmailSender {
    api_key: SecretString,
    from: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl ResendEmailSender {
    pub fn new(
        api_key: SecretString,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::new(ErrorCode::NotificationError, e.to_string()))?;

        Ok(Self {
            api_key,
            from: from.into(),
            base_url: DEFAULT_RESEND_BASE_URL.to_string(),
            http_client,
        })
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Renders a known template with its variables.
pub fn render_template(
    template: &str,
    data: &BTreeMap<String, String>,
) -> Result<RenderedEmail, DomainError> {
    let var = |key: &str| data.get(key).map(String::as_str).unwrap_or("");

    match template {
        SUBSCRIPTION_CONFIRMATION_TEMPLATE => {
            let invoice_line = match data.get("invoiceLink").filter(|l| !l.is_empty()) {
                Some(link) => format!(r#"<p><a href="{}">View your invoice</a></p>"#, link),
                None => String::new(),
            };

            Ok(RenderedEmail {
                subject: format!("Your {} subscription is confirmed", var("planName")),
                html: format!(
                    concat!(
                        "<p>Hi {user},</p>",
                        "<p>Thanks for subscribing to the <strong>{plan}</strong> plan.</p>",
                        "<p>Amount: {amount} {currency}<br>Next renewal: {renewal}</p>",
                        "{invoice}",
                        r#"<p><a href="{dashboard}">Go to your dashboard</a></p>"#,
                    ),
                    user = var("userName"),
                    plan = var("planName"),
                    amount = var("amount"),
                    currency = var("currency"),
                    renewal = var("nextRenewal"),
                    invoice = invoice_line,
                    dashboard = var("dashboardLink"),
                ),
            })
        }
        other => Err(DomainError::new(
            ErrorCode::NotificationError,
            format!("Unknown email template: {}", other),
        )),
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send_templated(&self, email: &TemplatedEmail) -> Result<(), DomainError> {
        let rendered = render_template(&email.template, &email.data)?;

        let request = ResendRequest {
            from: &self.from,
            to: vec![email.destination.as_str()],
            subject: &rendered.subject,
            html: &rendered.html,
        };

        let response = self
            .http_client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::NotificationError,
                    format!("Failed to send email: {}", e),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::new(
                ErrorCode::NotificationError,
                format!("Resend API error ({}): {}", status, error_text),
            )
            .with_detail("template", email.template.clone()));
        }

        tracing::info!(template = %email.template, "Templated email sent");
        Ok(())
    }
}
