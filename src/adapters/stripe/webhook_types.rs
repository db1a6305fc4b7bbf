//! Stripe wire types for payment intents and webhook handling.
//!
//! These types mirror Stripe JSON as it arrives from the API and in webhook
//! payloads, and convert into the domain's `PaymentIntent`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::payment::{PaymentIntent, PaymentIntentStatus};
use crate::ports::{PaymentError, WebhookEvent, WebhookEventData, WebhookEventType};

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty or missing.
    MissingHeader,
    /// Missing timestamp component (t=...).
    MissingTimestamp,
    /// Missing v1 signature component.
    MissingV1Signature,
    /// Invalid timestamp format.
    InvalidTimestamp,
    /// Invalid signature format (not valid hex).
    InvalidSignatureFormat,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "Missing Stripe-Signature header"),
            Self::MissingTimestamp => write!(f, "Missing timestamp (t=) in signature"),
            Self::MissingV1Signature => write!(f, "Missing v1 signature in header"),
            Self::InvalidTimestamp => write!(f, "Invalid timestamp format"),
            Self::InvalidSignatureFormat => write!(f, "Invalid signature format (not valid hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Parsed Stripe-Signature header components.
///
/// The header format is: `t=timestamp,v1=signature[,v1=signature...]`.
/// Stripe sends several v1 entries while a signing secret is being rolled;
/// a payload is authentic if any of them matches.
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp when Stripe signed the delivery.
    pub timestamp: i64,

    /// v1 signatures (HMAC-SHA256), hex-decoded. Never empty.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parse a Stripe-Signature header into components.
    ///
    /// Unknown schemes (v0, future versions) are ignored.
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.trim().is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(SignatureParseError::MissingTimestamp)?;

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signatures.push(
                        hex_decode(value).ok_or(SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureParseError::MissingTimestamp)?;
        if v1_signatures.is_empty() {
            return Err(SignatureParseError::MissingV1Signature);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes to hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Event Types
// ════════════════════════════════════════════════════════════════════════════════

/// Raw Stripe webhook event as received from the API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeWebhookEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type (e.g., "payment_intent.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    /// Event payload containing the affected object.
    pub data: StripeEventData,

    /// Whether this is a live or test event.
    #[serde(default)]
    pub livemode: bool,

    /// Stripe API version used for this event.
    pub api_version: Option<String>,

    /// Number of deliveries still pending for this event.
    #[serde(default)]
    pub pending_webhooks: i32,

    /// Request details for events created by API calls.
    pub request: Option<StripeEventRequest>,
}

impl StripeWebhookEvent {
    /// Convert into the gateway-neutral event.
    ///
    /// The data object is decoded according to the event type family;
    /// types with no dedicated shape keep their raw JSON.
    pub fn into_webhook_event(self) -> Result<WebhookEvent, PaymentError> {
        let event_type = WebhookEventType::from_provider(&self.event_type);

        let data = match self.event_type.as_str() {
            s if s.starts_with("payment_intent.") => {
                let pi: StripePaymentIntent =
                    serde_json::from_value(self.data.object).map_err(|e| {
                        PaymentError::invalid_webhook(format!("Invalid payment intent: {}", e))
                    })?;

                let failure_message = pi.failure_message();
                WebhookEventData::PaymentIntent {
                    intent: pi.into(),
                    failure_message,
                }
            }

            s if s.starts_with("charge.") => {
                let charge: StripeCharge = serde_json::from_value(self.data.object)
                    .map_err(|e| PaymentError::invalid_webhook(format!("Invalid charge: {}", e)))?;

                WebhookEventData::Charge {
                    charge_id: charge.id,
                    payment_intent_id: charge.payment_intent,
                    amount_refunded: charge.amount_refunded,
                    currency: charge.currency,
                }
            }

            _ => WebhookEventData::Raw {
                json: self.data.object.to_string(),
            },
        };

        Ok(WebhookEvent {
            id: self.id,
            event_type,
            data,
            created_at: self.created,
        })
    }
}

/// Event data container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object affected by this event.
    pub object: serde_json::Value,

    /// Previous values for updated fields (on update events).
    pub previous_attributes: Option<serde_json::Value>,
}

/// Request context for events triggered by API calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventRequest {
    /// Request ID from the triggering API call.
    pub id: Option<String>,

    /// Idempotency key if provided.
    pub idempotency_key: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Object Types
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe PaymentIntent object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentIntent {
    /// PaymentIntent ID (pi_...).
    pub id: String,

    /// Amount in minor units.
    pub amount: i64,

    /// Three-letter currency code, lowercase.
    pub currency: String,

    /// requires_payment_method, requires_confirmation, requires_action,
    /// processing, requires_capture, canceled, succeeded.
    pub status: String,

    /// Present on API responses; omitted from some webhook payloads.
    pub client_secret: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Error from the last failed attempt, if any.
    pub last_payment_error: Option<StripePaymentError>,
}

impl StripePaymentIntent {
    /// Message from the last failed attempt, if any.
    pub fn failure_message(&self) -> Option<String> {
        self.last_payment_error
            .as_ref()
            .and_then(|e| e.message.clone())
    }
}

impl From<StripePaymentIntent> for PaymentIntent {
    fn from(pi: StripePaymentIntent) -> Self {
        let status =
            PaymentIntentStatus::from_provider(&pi.status, pi.last_payment_error.is_some());
        PaymentIntent {
            id: pi.id,
            amount_minor: pi.amount,
            currency: pi.currency,
            status,
            client_secret: pi.client_secret,
            metadata: pi.metadata,
        }
    }
}

/// `last_payment_error` on a PaymentIntent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentError {
    pub code: Option<String>,
    pub decline_code: Option<String>,
    pub message: Option<String>,
}

/// Stripe Charge object (as delivered with `charge.*` events).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCharge {
    /// Charge ID (ch_...).
    pub id: String,

    /// PaymentIntent that created this charge.
    pub payment_intent: Option<String>,

    #[serde(default)]
    pub amount_refunded: i64,

    pub currency: String,

    #[serde(default)]
    pub refunded: bool,
}

/// Error envelope returned by the Stripe API on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeApiError,
}

/// Body of a Stripe API error.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    /// api_error, card_error, idempotency_error, invalid_request_error.
    #[serde(rename = "type")]
    pub error_type: Option<String>,

    pub code: Option<String>,

    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Header Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn parse_signature_header_valid() {
        let header = "t=1704067200,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd";
        let parsed = SignatureHeader::parse(header).unwrap();

        assert_eq!(parsed.timestamp, 1704067200);
        assert_eq!(parsed.v1_signatures.len(), 1);
        assert_eq!(parsed.v1_signatures[0].len(), 32);
    }

    #[test]
    fn parse_signature_header_collects_every_v1() {
        let header = "t=1704067200,v1=abcd,v0=ffff,v1=0123";
        let parsed = SignatureHeader::parse(header).unwrap();

        assert_eq!(parsed.v1_signatures, vec![vec![0xab, 0xcd], vec![0x01, 0x23]]);
    }

    #[test]
    fn parse_signature_header_missing_timestamp() {
        let result = SignatureHeader::parse("v1=abcd");
        assert_eq!(result.unwrap_err(), SignatureParseError::MissingTimestamp);
    }

    #[test]
    fn parse_signature_header_missing_v1() {
        let result = SignatureHeader::parse("t=1704067200,v0=abcd");
        assert_eq!(result.unwrap_err(), SignatureParseError::MissingV1Signature);
    }

    #[test]
    fn parse_signature_header_empty() {
        let result = SignatureHeader::parse("");
        assert_eq!(result.unwrap_err(), SignatureParseError::MissingHeader);
    }

    #[test]
    fn parse_signature_header_invalid_timestamp() {
        let result = SignatureHeader::parse("t=yesterday,v1=abcd");
        assert_eq!(result.unwrap_err(), SignatureParseError::InvalidTimestamp);
    }

    #[test]
    fn parse_signature_header_invalid_hex() {
        let result = SignatureHeader::parse("t=1704067200,v1=zzzz");
        assert_eq!(result.unwrap_err(), SignatureParseError::InvalidSignatureFormat);
    }

    #[test]
    fn parse_signature_header_odd_length_hex() {
        let result = SignatureHeader::parse("t=1704067200,v1=abc");
        assert_eq!(result.unwrap_err(), SignatureParseError::InvalidSignatureFormat);
    }

    #[test]
    fn hex_encode_bytes() {
        assert_eq!(hex_encode(&[]), "");
        assert_eq!(hex_encode(&[0x00, 0xff, 0x1a]), "00ff1a");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Object Parsing Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn parse_payment_intent_succeeded_event() {
        let json = r#"{
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "created": 1704067200,
            "data": {
                "object": {
                    "id": "pi_123",
                    "object": "payment_intent",
                    "amount": 4999,
                    "currency": "usd",
                    "status": "succeeded",
                    "metadata": {"userId": "user-1", "courseId": "course-1", "enrollmentType": "FULL"}
                }
            },
            "livemode": false,
            "pending_webhooks": 1
        }"#;

        let event: StripeWebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, "payment_intent.succeeded");

        let pi: StripePaymentIntent = serde_json::from_value(event.data.object).unwrap();
        let intent = PaymentIntent::from(pi);
        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.amount_minor, 4999);
        assert_eq!(intent.status, PaymentIntentStatus::Succeeded);
        assert_eq!(intent.metadata.get("courseId").map(String::as_str), Some("course-1"));
        assert!(intent.client_secret.is_none());
    }

    #[test]
    fn payment_intent_with_last_error_is_failed() {
        let json = r#"{
            "id": "pi_456",
            "amount": 11000,
            "currency": "usd",
            "status": "requires_payment_method",
            "last_payment_error": {"code": "card_declined", "message": "Your card was declined."}
        }"#;

        let pi: StripePaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(pi.failure_message().as_deref(), Some("Your card was declined."));

        let intent = PaymentIntent::from(pi);
        assert_eq!(intent.status, PaymentIntentStatus::Failed);
        assert!(intent.metadata.is_empty());
    }

    #[test]
    fn parse_charge_object() {
        let json = r#"{
            "id": "ch_1",
            "object": "charge",
            "payment_intent": "pi_123",
            "amount_refunded": 4999,
            "currency": "usd",
            "refunded": true
        }"#;

        let charge: StripeCharge = serde_json::from_str(json).unwrap();
        assert_eq!(charge.payment_intent.as_deref(), Some("pi_123"));
        assert_eq!(charge.amount_refunded, 4999);
        assert!(charge.refunded);
    }

    #[test]
    fn parse_error_response() {
        let json = r#"{"error": {"type": "invalid_request_error", "code": "resource_missing", "message": "No such payment_intent: 'pi_x'"}}"#;

        let err: StripeErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.code.as_deref(), Some("resource_missing"));
        assert_eq!(err.error.error_type.as_deref(), Some("invalid_request_error"));
    }
}
