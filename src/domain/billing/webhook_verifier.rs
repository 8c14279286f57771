//! Stripe webhook signature verification.
//!
//! Recomputes HMAC-SHA256 over `"{t}.{payload}"` with the endpoint signing
//! secret and compares it against every `v1` signature in the header in
//! constant time. The signed timestamp must fall inside the tolerance window.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::reconcile_errors::AuthenticityError;
use super::stripe_event::StripeEvent;

type HmacSha256 = Hmac<Sha256>;

/// Default maximum age for webhook events (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// All v1 signatures; more than one is sent while a secret is rolled.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>][,v0=<legacy>]`
    pub fn parse(header: &str) -> Result<Self, AuthenticityError> {
        if header.trim().is_empty() {
            return Err(AuthenticityError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| AuthenticityError::MalformedHeader("invalid header format".into()))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(value.trim().parse().map_err(|_| {
                        AuthenticityError::MalformedHeader("invalid timestamp".into())
                    })?);
                }
                "v1" => {
                    let signature = hex::decode(value.trim()).map_err(|_| {
                        AuthenticityError::MalformedHeader("invalid v1 signature hex".into())
                    })?;
                    v1_signatures.push(signature);
                }
                // v0 and unknown schemes are ignored
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| AuthenticityError::MalformedHeader("missing timestamp".into()))?;
        if v1_signatures.is_empty() {
            return Err(AuthenticityError::MalformedHeader("missing v1 signature".into()));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    /// The webhook signing secret from the Stripe dashboard.
    secret: SecretString,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    /// Creates a verifier with the default 5 minute tolerance.
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance_secs(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verifies the webhook signature and parses the event envelope.
    ///
    /// # Errors
    ///
    /// - `MissingHeader` / `MalformedHeader` - header absent or unparseable
    /// - `TimestampOutOfRange` - signed longer ago than the tolerance
    /// - `TimestampInFuture` - signed beyond the allowed clock skew
    /// - `SignatureMismatch` - no v1 signature matches
    /// - `UnparseablePayload` - body is not a Stripe event envelope
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<StripeEvent, AuthenticityError> {
        self.verify_and_parse_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    pub(crate) fn verify_and_parse_at(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> Result<StripeEvent, AuthenticityError> {
        let header = SignatureHeader::parse(signature_header.ok_or(AuthenticityError::MissingHeader)?)?;

        self.validate_timestamp(header.timestamp, now)?;

        let expected = self.compute_signature(header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            tracing::warn!(
                signed_at = header.timestamp,
                candidates = header.v1_signatures.len(),
                "Invalid webhook signature"
            );
            return Err(AuthenticityError::SignatureMismatch);
        }

        serde_json::from_slice(payload)
            .map_err(|e| AuthenticityError::UnparseablePayload(e.to_string()))
    }

    fn validate_timestamp(&self, timestamp: i64, now: i64) -> Result<(), AuthenticityError> {
        // Hostile timestamps can sit anywhere in i64
        let age = now
            .checked_sub(timestamp)
            .ok_or(AuthenticityError::TimestampOutOfRange)?;

        if age > self.tolerance_secs {
            tracing::warn!(
                event_timestamp = timestamp,
                age_secs = age,
                "Webhook event too old - possible replay"
            );
            return Err(AuthenticityError::TimestampOutOfRange);
        }

        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(AuthenticityError::TimestampInFuture);
        }

        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, AuthenticityError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AuthenticityError::SignatureMismatch)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds a `Stripe-Signature` header value, for fixtures and local replay tooling.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return format!("t={}", timestamp),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";
    const NOW: i64 = 1_704_067_200;

    fn verifier() -> StripeWebhookVerifier {
        StripeWebhookVerifier::new(SecretString::new(TEST_SECRET.to_string()))
    }

    fn payload() -> &'static str {
        r#"{"id":"evt_test123","type":"checkout.session.completed","created":1704067200,"data":{"object":{}},"livemode":false}"#
    }

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_single_v1() {
        let header = SignatureHeader::parse(&format!("t=1234567890,v1={}", "a".repeat(64))).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signatures.len(), 1);
        assert_eq!(header.v1_signatures[0].len(), 32);
    }

    #[test]
    fn parse_header_collects_every_v1_and_skips_v0() {
        let header = SignatureHeader::parse(&format!(
            "t=1,v1={},v0={},v1={}",
            "a".repeat(64),
            "b".repeat(64),
            "c".repeat(64)
        ))
        .unwrap();

        assert_eq!(header.v1_signatures.len(), 2);
    }

    #[test]
    fn parse_header_failures() {
        let sig = "a".repeat(64);
        let cases = vec![
            format!("v1={}", sig),
            "t=1234567890".to_string(),
            format!("t=not_a_number,v1={}", sig),
            "t=1234567890,v1=not_valid_hex".to_string(),
            "t1234567890".to_string(),
        ];
        for case in cases {
            assert!(
                matches!(SignatureHeader::parse(&case), Err(AuthenticityError::MalformedHeader(_))),
                "{}",
                case
            );
        }
    }

    #[test]
    fn parse_empty_header_is_missing() {
        assert_eq!(SignatureHeader::parse(""), Err(AuthenticityError::MissingHeader));
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let header = sign_payload(TEST_SECRET, NOW, payload().as_bytes());

        let event = verifier()
            .verify_and_parse_at(payload().as_bytes(), Some(&header), NOW)
            .unwrap();

        assert_eq!(event.id, "evt_test123");
        assert_eq!(event.event_type, "checkout.session.completed");
    }

    #[test]
    fn verify_accepts_second_v1_signature() {
        let good = sign_payload(TEST_SECRET, NOW, payload().as_bytes());
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={},v1={},v1={}", NOW, "0".repeat(64), good_sig);

        assert!(verifier()
            .verify_and_parse_at(payload().as_bytes(), Some(&header), NOW)
            .is_ok());
    }

    #[test]
    fn verify_missing_header_fails() {
        let result = verifier().verify_and_parse_at(payload().as_bytes(), None, NOW);
        assert_eq!(result.unwrap_err(), AuthenticityError::MissingHeader);
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let header = sign_payload("whsec_other", NOW, payload().as_bytes());

        let result = verifier().verify_and_parse_at(payload().as_bytes(), Some(&header), NOW);

        assert_eq!(result.unwrap_err(), AuthenticityError::SignatureMismatch);
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let header = sign_payload(TEST_SECRET, NOW, payload().as_bytes());
        let tampered = payload().replace("evt_test123", "evt_hacked");

        let result = verifier().verify_and_parse_at(tampered.as_bytes(), Some(&header), NOW);

        assert_eq!(result.unwrap_err(), AuthenticityError::SignatureMismatch);
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_window_boundaries() {
        let v = verifier();
        assert!(v.validate_timestamp(NOW - 300, NOW).is_ok());
        assert_eq!(
            v.validate_timestamp(NOW - 301, NOW),
            Err(AuthenticityError::TimestampOutOfRange)
        );
        assert!(v.validate_timestamp(NOW + 30, NOW).is_ok());
        assert_eq!(
            v.validate_timestamp(NOW + 120, NOW),
            Err(AuthenticityError::TimestampInFuture)
        );
    }

    #[test]
    fn custom_tolerance_is_respected() {
        let v = verifier().with_tolerance_secs(10);
        assert_eq!(
            v.validate_timestamp(NOW - 11, NOW),
            Err(AuthenticityError::TimestampOutOfRange)
        );
    }

    #[test]
    fn stale_signed_payload_is_rejected() {
        let header = sign_payload(TEST_SECRET, NOW - 600, payload().as_bytes());

        let result = verifier().verify_and_parse_at(payload().as_bytes(), Some(&header), NOW);

        assert_eq!(result.unwrap_err(), AuthenticityError::TimestampOutOfRange);
    }

    #[test]
    fn extreme_header_timestamps_are_rejected_not_panicking() {
        let sig = "a".repeat(64);

        let oldest = format!("t={},v1={}", i64::MIN, sig);
        assert_eq!(
            verifier().verify_and_parse_at(b"{}", Some(&oldest), NOW).unwrap_err(),
            AuthenticityError::TimestampOutOfRange
        );

        let newest = format!("t={},v1={}", i64::MAX, sig);
        assert_eq!(
            verifier().verify_and_parse_at(b"{}", Some(&newest), NOW).unwrap_err(),
            AuthenticityError::TimestampInFuture
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Payload Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_signed_non_event_payload_fails() {
        let body = b"not valid json";
        let header = sign_payload(TEST_SECRET, NOW, body);

        let result = verifier().verify_and_parse_at(body, Some(&header), NOW);

        assert!(matches!(result, Err(AuthenticityError::UnparseablePayload(_))));
    }

    #[test]
    fn constant_time_compare_behaviour() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
    }
}
