use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    SkippedDuplicate,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::SkippedDuplicate => "skipped_duplicate",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(DeliveryStatus::Sent),
            "failed" => Some(DeliveryStatus::Failed),
            "skipped_duplicate" => Some(DeliveryStatus::SkippedDuplicate),
            _ => None,
        }
    }
}

/// Append-only record of a single send attempt.
///
/// `occurrence_at` names the firing the attempt belongs to: the claimed
/// next fire time, or the start of the UTC day for birthday messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeLog {
    pub id: Uuid,
    pub message_id: Uuid,
    pub member_id: Uuid,
    pub occurrence_at: DateTime<Utc>,
    pub status: DeliveryStatus,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOutcomeLog {
    pub message_id: Uuid,
    pub member_id: Uuid,
    pub occurrence_at: DateTime<Utc>,
    pub status: DeliveryStatus,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
}
