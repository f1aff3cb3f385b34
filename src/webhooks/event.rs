use serde::Deserialize;
use uuid::Uuid;

/// Outer shape of every provider callback. `id` is the provider-assigned
/// idempotency key.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    CheckoutCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaid,
    InvoiceFailed,
    PayoutCreated,
}

impl EventType {
    pub fn parse(s: &str) -> Option<EventType> {
        match s {
            "checkout.completed" => Some(Self::CheckoutCompleted),
            "subscription.created" => Some(Self::SubscriptionCreated),
            "subscription.updated" => Some(Self::SubscriptionUpdated),
            "subscription.deleted" => Some(Self::SubscriptionDeleted),
            "invoice.paid" => Some(Self::InvoicePaid),
            "invoice.failed" => Some(Self::InvoiceFailed),
            "payout.created" => Some(Self::PayoutCreated),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutData {
    pub gallery_id: Uuid,
    pub customer_email: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionData {
    pub subscription_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceData {
    pub subscription_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PayoutData {
    pub payout_id: String,
    pub amount_cents: i64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_parse() {
        for (raw, expected) in [
            ("checkout.completed", EventType::CheckoutCompleted),
            ("subscription.created", EventType::SubscriptionCreated),
            ("subscription.updated", EventType::SubscriptionUpdated),
            ("subscription.deleted", EventType::SubscriptionDeleted),
            ("invoice.paid", EventType::InvoicePaid),
            ("invoice.failed", EventType::InvoiceFailed),
            ("payout.created", EventType::PayoutCreated),
        ] {
            assert_eq!(EventType::parse(raw), Some(expected));
        }
    }

    #[test]
    fn unknown_types_parse_to_none() {
        assert_eq!(EventType::parse("customer.created"), None);
        assert_eq!(EventType::parse(""), None);
    }

    #[test]
    fn envelope_tolerates_missing_data() {
        let env: WebhookEnvelope =
            serde_json::from_str(r#"{"id":"evt_1","type":"payout.created"}"#).unwrap();
        assert_eq!(env.id, "evt_1");
        assert!(env.data.is_null());
    }

    #[test]
    fn checkout_data_parses() {
        let data: CheckoutData = serde_json::from_value(serde_json::json!({
            "gallery_id": "4b6e108a-9999-4b58-9a23-5a1a2f1a0001",
            "customer_email": "client@example.com",
        }))
        .unwrap();
        assert_eq!(data.customer_email, "client@example.com");
    }

    #[test]
    fn subscription_data_tolerates_missing_status() {
        let data: SubscriptionData =
            serde_json::from_value(serde_json::json!({"subscription_id": "sub_1"})).unwrap();
        assert!(data.status.is_none());
        assert!(data.customer_email.is_none());
    }
}
