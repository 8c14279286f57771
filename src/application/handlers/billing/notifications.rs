//! Outbound notifications for reconciled deliveries.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::billing::ReconcileError;
use crate::domain::foundation::Timestamp;
use crate::ports::{
    AlertPublisher, EmailSender, TemplatedEmail, SUBJECT_EXCEPTION, SUBJECT_SIGNATURE_ERROR,
    SUBJECT_SUBSCRIPTION_DELETED, SUBJECT_SUCCESS, SUBSCRIPTION_CONFIRMATION_TEMPLATE,
};

/// Alert subjects, overridable from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSubjects {
    pub success: String,
    pub subscription_deleted: String,
    pub signature_error: String,
    pub exception: String,
}

impl Default for AlertSubjects {
    fn default() -> Self {
        Self {
            success: SUBJECT_SUCCESS.to_string(),
            subscription_deleted: SUBJECT_SUBSCRIPTION_DELETED.to_string(),
            signature_error: SUBJECT_SIGNATURE_ERROR.to_string(),
            exception: SUBJECT_EXCEPTION.to_string(),
        }
    }
}

impl AlertSubjects {
    pub fn for_failure(&self, err: &ReconcileError) -> &str {
        if err.is_authenticity_failure() {
            &self.signature_error
        } else {
            &self.exception
        }
    }
}

/// Settings the notifier needs from configuration.
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    pub subjects: AlertSubjects,
    pub dashboard_link: String,
    pub confirmation_template: String,
}

impl NotificationSettings {
    pub fn new(dashboard_link: impl Into<String>) -> Self {
        Self {
            subjects: AlertSubjects::default(),
            dashboard_link: dashboard_link.into(),
            confirmation_template: SUBSCRIPTION_CONFIRMATION_TEMPLATE.to_string(),
        }
    }
}

/// Values rendered into the subscription confirmation email.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationDetails {
    pub destination: String,
    pub user_name: String,
    pub plan_name: String,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub next_renewal: Option<Timestamp>,
    pub invoice_link: Option<String>,
}

/// Sends alerts and confirmation emails.
///
/// Both are best-effort: failures are logged and never change the
/// outcome of the delivery that triggered them.
pub struct Notifier {
    alerts: Arc<dyn AlertPublisher>,
    email: Arc<dyn EmailSender>,
    settings: NotificationSettings,
}

impl Notifier {
    pub fn new(
        alerts: Arc<dyn AlertPublisher>,
        email: Arc<dyn EmailSender>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            alerts,
            email,
            settings,
        }
    }

    pub fn subjects(&self) -> &AlertSubjects {
        &self.settings.subjects
    }

    pub async fn alert(&self, subject: &str, message: &str) {
        if let Err(e) = self.alerts.publish(subject, message).await {
            tracing::error!(subject, error = %e, "Failed to publish alert");
        }
    }

    pub async fn send_confirmation(&self, details: ConfirmationDetails) {
        let email = self.confirmation_email(details);
        match self.email.send_templated(&email).await {
            Ok(()) => tracing::info!(template = %email.template, "Confirmation email sent"),
            Err(e) => tracing::warn!(template = %email.template, error = %e, "Confirmation email failed"),
        }
    }

    fn confirmation_email(&self, details: ConfirmationDetails) -> TemplatedEmail {
        TemplatedEmail::new(details.destination, self.settings.confirmation_template.clone())
            .with_var("userName", details.user_name)
            .with_var("planName", details.plan_name)
            .with_var(
                "amount",
                details.amount.map(|a| a.to_string()).unwrap_or_default(),
            )
            .with_var(
                "currency",
                details.currency.map(|c| c.to_uppercase()).unwrap_or_default(),
            )
            .with_var(
                "nextRenewal",
                details.next_renewal.map(|t| t.to_date_string()).unwrap_or_default(),
            )
            .with_var("dashboardLink", self.settings.dashboard_link.clone())
            .with_var("invoiceLink", details.invoice_link.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notify::{RecordingAlertPublisher, RecordingEmailSender};
    use crate::domain::billing::AuthenticityError;

    fn notifier(alerts: &RecordingAlertPublisher, email: &RecordingEmailSender) -> Notifier {
        Notifier::new(
            Arc::new(alerts.clone()),
            Arc::new(email.clone()),
            NotificationSettings::new("https://app.example.com/dashboard"),
        )
    }

    #[test]
    fn failure_subject_depends_on_error_kind() {
        let subjects = AlertSubjects::default();

        assert_eq!(
            subjects.for_failure(&AuthenticityError::SignatureMismatch.into()),
            "Stripe Webhook Signature Error"
        );
        assert_eq!(
            subjects.for_failure(&ReconcileError::external("stripe", "timeout")),
            "Stripe Webhook Exception"
        );
    }

    #[tokio::test]
    async fn alert_failure_is_swallowed() {
        let alerts = RecordingAlertPublisher::failing();
        let email = RecordingEmailSender::new();

        notifier(&alerts, &email).alert("Stripe Webhook Success", "ok").await;

        assert_eq!(alerts.alerts().len(), 1);
    }

    #[tokio::test]
    async fn confirmation_carries_all_template_vars() {
        let alerts = RecordingAlertPublisher::new();
        let email = RecordingEmailSender::new();

        notifier(&alerts, &email)
            .send_confirmation(ConfirmationDetails {
                destination: "ada@example.com".into(),
                user_name: "ada".into(),
                plan_name: "Pro".into(),
                amount: Some(Decimal::new(999, 2)),
                currency: Some("usd".into()),
                next_renewal: Timestamp::from_unix_secs(1_706_745_600),
                invoice_link: Some("https://pay.stripe.com/invoice/in_1/pdf".into()),
            })
            .await;

        let sent = email.sent();
        assert_eq!(sent.len(), 1);
        let data = &sent[0].data;
        assert_eq!(sent[0].destination, "ada@example.com");
        assert_eq!(data["amount"], "9.99");
        assert_eq!(data["currency"], "USD");
        assert_eq!(data["nextRenewal"], "2024-02-01");
        assert_eq!(data["dashboardLink"], "https://app.example.com/dashboard");
        assert_eq!(data["invoiceLink"], "https://pay.stripe.com/invoice/in_1/pdf");
    }

    #[tokio::test]
    async fn email_failure_is_swallowed() {
        let alerts = RecordingAlertPublisher::new();
        let email = RecordingEmailSender::failing();

        notifier(&alerts, &email)
            .send_confirmation(ConfirmationDetails {
                destination: "ada@example.com".into(),
                ..Default::default()
            })
            .await;

        assert_eq!(email.sent().len(), 1);
        assert_eq!(email.sent()[0].data["invoiceLink"], "");
    }
}
