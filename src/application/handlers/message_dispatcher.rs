use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    application::services::{
        recipient_resolver::{RecipientFailure, ResolvedRecipient},
        sms::SmsTransport,
        template,
    },
    domain::{
        errors::DispatchError,
        models::{DeliveryStatus, Message, NewOutcomeLog, SmsProviderConfig},
        repositories::OutcomeLogRepository,
    },
};

/// Provider config paired with the transport that speaks to it.
#[derive(Clone)]
pub struct SmsChannel {
    pub config: SmsProviderConfig,
    pub transport: Arc<dyn SmsTransport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientOutcome {
    pub member_id: Option<Uuid>,
    pub spec_id: Option<Uuid>,
    pub phone: Option<String>,
    pub status: DeliveryStatus,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
}

impl RecipientOutcome {
    pub fn from_failure(failure: RecipientFailure) -> Self {
        Self {
            member_id: failure.member_id,
            spec_id: failure.spec_id,
            phone: None,
            status: DeliveryStatus::Failed,
            provider_message_id: None,
            error: Some(failure.reason),
        }
    }
}

pub struct MessageDispatchHandler {
    outcome_repo: Arc<dyn OutcomeLogRepository>,
}

impl MessageDispatchHandler {
    pub fn new(outcome_repo: Arc<dyn OutcomeLogRepository>) -> Self {
        Self { outcome_repo }
    }

    /// Sends `message` to one recipient and records exactly one outcome log.
    ///
    /// A previous `sent` log for the pair within the same `occurrence_at`
    /// turns the attempt into a `skipped_duplicate` without contacting the
    /// provider. Later occurrences of a recurring message send again.
    pub async fn dispatch(
        &self,
        message: &Message,
        recipient: &ResolvedRecipient,
        channel: &SmsChannel,
        occurrence_at: DateTime<Utc>,
    ) -> RecipientOutcome {
        let member_id = recipient.member.id;
        let mut outcome = RecipientOutcome {
            member_id: Some(member_id),
            spec_id: recipient.spec_id,
            phone: Some(recipient.phone.to_string()),
            status: DeliveryStatus::Failed,
            provider_message_id: None,
            error: None,
        };

        match self
            .outcome_repo
            .has_sent(message.id, member_id, occurrence_at)
            .await
        {
            Ok(true) => {
                tracing::info!(message_id = %message.id, %member_id, "already delivered, skipping");
                outcome.status = DeliveryStatus::SkippedDuplicate;
                self.record(message.id, occurrence_at, &outcome).await;
                return outcome;
            }
            Ok(false) => {}
            Err(err) => {
                let err = DispatchError::Persistence(err);
                tracing::error!(message_id = %message.id, %member_id, error = %err, "delivery history unavailable");
                outcome.error = Some(format!("could not check previous deliveries: {err}"));
                self.record(message.id, occurrence_at, &outcome).await;
                return outcome;
            }
        }

        let body = template::render(&message.body, &recipient.member.template_fields());

        match channel
            .transport
            .send(&channel.config, &recipient.phone, &body)
            .await
        {
            Ok(receipt) => {
                tracing::info!(
                    message_id = %message.id,
                    %member_id,
                    provider_message_id = receipt.provider_message_id.as_deref().unwrap_or("-"),
                    "sms sent"
                );
                outcome.status = DeliveryStatus::Sent;
                outcome.provider_message_id = receipt.provider_message_id;
            }
            Err(err) => {
                let err = DispatchError::Transport(err.to_string());
                tracing::warn!(message_id = %message.id, %member_id, error = %err, "sms send failed");
                outcome.error = Some(err.to_string());
            }
        }

        self.record(message.id, occurrence_at, &outcome).await;
        outcome
    }

    /// Logs a resolution failure that names a member. Spec-level failures
    /// without a member have nothing to attach a log to.
    pub async fn record_failure(
        &self,
        message_id: Uuid,
        occurrence_at: DateTime<Utc>,
        outcome: &RecipientOutcome,
    ) {
        self.record(message_id, occurrence_at, outcome).await;
    }

    async fn record(&self, message_id: Uuid, occurrence_at: DateTime<Utc>, outcome: &RecipientOutcome) {
        let Some(member_id) = outcome.member_id else {
            return;
        };
        let log = NewOutcomeLog {
            message_id,
            member_id,
            occurrence_at,
            status: outcome.status,
            provider_message_id: outcome.provider_message_id.clone(),
            error: outcome.error.clone(),
        };
        if let Err(err) = self.outcome_repo.append(log).await {
            let err = DispatchError::Persistence(err);
            tracing::error!(%message_id, %member_id, error = %err, "failed to write outcome log");
        }
    }
}
