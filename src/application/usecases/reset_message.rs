use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{Message, MessageCategory, MessageStatus},
    repositories::MessageRepository,
};

pub struct ResetMessageRequest {
    pub message_id: Uuid,
    /// Overrides the stored next fire time.
    pub next_fire_at: Option<DateTime<Utc>>,
}

/// Manual way out of `error` and `completed`.
pub struct ResetMessageUseCase {
    repo: Arc<dyn MessageRepository>,
}

impl ResetMessageUseCase {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        request: ResetMessageRequest,
        now: DateTime<Utc>,
    ) -> Result<Message, DomainError> {
        let message = self
            .repo
            .get(request.message_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("message {}", request.message_id)))?;

        if !message.status.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "message is {}, only completed or error messages can be reset",
                message.status.as_str()
            )));
        }

        let (status, next_fire_at) = if message.category == MessageCategory::Birthday {
            (MessageStatus::Active, None)
        } else {
            let next = request
                .next_fire_at
                .or(message.next_fire_at)
                .ok_or_else(|| DomainError::Validation("next_fire_at is required".to_string()))?
                // A fire time older than the look-back window would never be selected.
                .max(now);
            let status = if next > now {
                MessageStatus::Scheduled
            } else {
                MessageStatus::Active
            };
            (status, Some(next))
        };

        let reopened = self
            .repo
            .reopen(request.message_id, status, next_fire_at)
            .await?
            .ok_or_else(|| DomainError::Conflict("message changed while resetting".to_string()))?;

        tracing::info!(
            message_id = %reopened.id,
            status = reopened.status.as_str(),
            "message reset"
        );
        Ok(reopened)
    }
}
