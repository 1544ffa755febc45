use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    application::{
        handlers::message_dispatcher::{MessageDispatchHandler, RecipientOutcome, SmsChannel},
        services::{
            recipient_resolver::{self, RecipientFailure, RecipientResolver, Resolution},
            rescheduler::{self, Transition},
            sms::SmsGateway,
        },
    },
    domain::{
        errors::DispatchError,
        models::{DeliveryStatus, MemberStatus, Message, MessageCategory, MessageStatus},
        repositories::{MemberDirectory, MessageRepository, SmsProviderRepository},
    },
};

pub const STALE_CLAIM_REASON: &str = "stale processing claim";
pub const MISSED_WINDOW_REASON: &str = "missed look-back window";

pub struct DispatchCycleConfig {
    /// How far behind the cycle time a due message may be and still fire.
    pub lookback: Duration,
    /// Age after which a `processing` claim is considered abandoned.
    pub stale_after: Duration,
}

impl Default for DispatchCycleConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::hours(24),
            stale_after: Duration::minutes(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCycleStatus {
    Completed,
    Scheduled,
    Active,
    Error,
    /// The claim was lost to a concurrent run or could not be written.
    Skipped,
}

impl From<MessageStatus> for MessageCycleStatus {
    fn from(value: MessageStatus) -> Self {
        match value {
            MessageStatus::Completed => MessageCycleStatus::Completed,
            MessageStatus::Scheduled => MessageCycleStatus::Scheduled,
            MessageStatus::Active => MessageCycleStatus::Active,
            MessageStatus::Error => MessageCycleStatus::Error,
            MessageStatus::Processing => MessageCycleStatus::Skipped,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageReport {
    pub message_id: Uuid,
    pub name: String,
    pub status: MessageCycleStatus,
    pub error: Option<String>,
    pub recipients: Vec<RecipientOutcome>,
}

impl MessageReport {
    fn new(message: &Message, status: MessageCycleStatus) -> Self {
        Self {
            message_id: message.id,
            name: message.name.clone(),
            status,
            error: None,
            recipients: Vec::new(),
        }
    }

    pub fn count(&self, status: DeliveryStatus) -> u32 {
        self.recipients.iter().filter(|r| r.status == status).count() as u32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleTotals {
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub reclaimed: u32,
    /// Messages whose fire time fell behind the look-back window.
    pub expired: u32,
    pub results: Vec<MessageReport>,
}

impl CycleReport {
    pub fn processed(&self) -> u32 {
        self.results
            .iter()
            .filter(|r| r.status != MessageCycleStatus::Skipped)
            .count() as u32
    }

    pub fn totals(&self) -> CycleTotals {
        self.results.iter().fold(CycleTotals::default(), |acc, r| CycleTotals {
            sent: acc.sent + r.count(DeliveryStatus::Sent),
            failed: acc.failed + r.count(DeliveryStatus::Failed),
            skipped: acc.skipped + r.count(DeliveryStatus::SkippedDuplicate),
        })
    }
}

/// One run of the scheduled-message job: janitor, selector, then resolver,
/// dispatcher and rescheduler per message. Messages and recipients are
/// handled one at a time in selector/resolver order.
pub struct RunDispatchCycleUseCase {
    message_repo: Arc<dyn MessageRepository>,
    provider_repo: Arc<dyn SmsProviderRepository>,
    directory: Arc<dyn MemberDirectory>,
    resolver: RecipientResolver,
    dispatcher: MessageDispatchHandler,
    gateway: SmsGateway,
    config: DispatchCycleConfig,
}

impl RunDispatchCycleUseCase {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        provider_repo: Arc<dyn SmsProviderRepository>,
        directory: Arc<dyn MemberDirectory>,
        dispatcher: MessageDispatchHandler,
        gateway: SmsGateway,
        config: DispatchCycleConfig,
    ) -> Self {
        Self {
            message_repo,
            provider_repo,
            resolver: RecipientResolver::new(directory.clone()),
            directory,
            dispatcher,
            gateway,
            config,
        }
    }

    /// Runs a full cycle at `now`. Only failures before any message is
    /// touched are returned as `Err`; everything later lands in the report.
    pub async fn execute(&self, now: DateTime<Utc>) -> anyhow::Result<CycleReport> {
        let reclaimed = self
            .message_repo
            .reclaim_stale(now - self.config.stale_after, STALE_CLAIM_REASON)
            .await?;
        for id in &reclaimed {
            tracing::warn!(message_id = %id, "stale processing claim moved to error");
        }

        let window_start = now - self.config.lookback;
        let expired = self
            .message_repo
            .expire_missed(window_start, MISSED_WINDOW_REASON)
            .await?;
        for id in &expired {
            tracing::warn!(message_id = %id, "missed look-back window, moved to error");
        }

        let due = self.message_repo.find_due(now, window_start).await?;
        let birthdays = self.message_repo.find_birthday().await?;

        tracing::info!(
            due = due.len(),
            birthday = birthdays.len(),
            reclaimed = reclaimed.len(),
            expired = expired.len(),
            "dispatch cycle started"
        );

        let mut results = Vec::with_capacity(due.len() + birthdays.len());
        for message in due.iter().chain(birthdays.iter()) {
            results.push(self.run_message(message, now).await);
        }

        let report = CycleReport {
            reclaimed: reclaimed.len() as u32,
            expired: expired.len() as u32,
            results,
        };
        let totals = report.totals();
        tracing::info!(
            processed = report.processed(),
            sent = totals.sent,
            failed = totals.failed,
            skipped = totals.skipped,
            "dispatch cycle finished"
        );
        Ok(report)
    }

    async fn run_message(&self, message: &Message, now: DateTime<Utc>) -> MessageReport {
        match self.message_repo.claim(message.id, now).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::info!(message_id = %message.id, "message claimed by another run");
                return MessageReport::new(message, MessageCycleStatus::Skipped);
            }
            Err(err) => {
                tracing::error!(message_id = %message.id, error = %err, "failed to claim message");
                let mut report = MessageReport::new(message, MessageCycleStatus::Skipped);
                report.error = Some(DispatchError::Persistence(err).to_string());
                return report;
            }
        }

        let channel = match self.channel().await {
            Ok(channel) => channel,
            Err(err) => {
                tracing::error!(message_id = %message.id, error = %err, "message not dispatched");
                let transition = Transition::Fail(err.to_string());
                return self.finish(message, transition, Vec::new()).await;
            }
        };

        let resolution = if message.category == MessageCategory::Birthday {
            self.birthday_recipients(now).await
        } else {
            self.resolver.resolve_all(&message.recipients).await
        };

        let occurrence_at = occurrence_of(message, now);
        let mut outcomes = Vec::with_capacity(resolution.recipients.len() + resolution.failures.len());
        for failure in resolution.failures {
            let outcome = RecipientOutcome::from_failure(failure);
            self.dispatcher
                .record_failure(message.id, occurrence_at, &outcome)
                .await;
            outcomes.push(outcome);
        }

        for recipient in &resolution.recipients {
            outcomes.push(
                self.dispatcher
                    .dispatch(message, recipient, &channel, occurrence_at)
                    .await,
            );
        }

        let transition = rescheduler::next_transition(message, now);
        self.finish(message, transition, outcomes).await
    }

    async fn finish(
        &self,
        message: &Message,
        transition: Transition,
        recipients: Vec<RecipientOutcome>,
    ) -> MessageReport {
        let mut report = MessageReport::new(message, transition.status().into());
        report.error = transition.error();
        report.recipients = recipients;

        // Config failures keep the old fire time so a reset can pick it up again.
        let next_fire_at = match &transition {
            Transition::Fail(_) => message.next_fire_at,
            other => other.next_fire_at(),
        };

        if let Err(err) = self
            .message_repo
            .update_schedule(message.id, transition.status(), next_fire_at, transition.error())
            .await
        {
            let err = DispatchError::Persistence(err);
            tracing::error!(message_id = %message.id, error = %err, "failed to persist message transition");
            report.error.get_or_insert_with(|| err.to_string());
        }

        tracing::info!(
            message_id = %message.id,
            status = transition.status().as_str(),
            sent = report.count(DeliveryStatus::Sent),
            failed = report.count(DeliveryStatus::Failed),
            "message cycle finished"
        );
        report
    }

    async fn channel(&self) -> Result<SmsChannel, DispatchError> {
        let config = self
            .provider_repo
            .find_default()
            .await
            .map_err(DispatchError::Persistence)?
            .ok_or_else(|| DispatchError::Configuration("no SMS provider configured".to_string()))?;

        config.validate().map_err(DispatchError::Configuration)?;

        let transport = self.gateway.get(config.kind).ok_or_else(|| {
            DispatchError::Configuration(format!(
                "no transport registered for provider kind {}",
                config.kind.as_str()
            ))
        })?;

        Ok(SmsChannel { config, transport })
    }

    async fn birthday_recipients(&self, now: DateTime<Utc>) -> Resolution {
        let today = now.date_naive();
        let mut resolution = Resolution::default();

        let members = match self.directory.members_with_birthday(today).await {
            Ok(members) => members,
            Err(err) => {
                resolution.failures.push(RecipientFailure {
                    spec_id: None,
                    member_id: None,
                    reason: format!("birthday lookup failed: {err}"),
                });
                return resolution;
            }
        };

        for member in members {
            if member.status != MemberStatus::Active || !member.has_birthday_on(today) {
                continue;
            }
            match recipient_resolver::eligible(member, None) {
                Ok(recipient) => resolution.recipients.push(recipient),
                Err((member_id, reason)) => resolution.failures.push(RecipientFailure {
                    spec_id: None,
                    member_id: Some(member_id),
                    reason,
                }),
            }
        }
        resolution
    }
}

/// The firing a cycle serves: the claimed next fire time, or the current UTC
/// day for birthday messages.
fn occurrence_of(message: &Message, now: DateTime<Utc>) -> DateTime<Utc> {
    match (message.category, message.next_fire_at) {
        (MessageCategory::Birthday, _) | (_, None) => start_of_day(now),
        (_, Some(next_fire_at)) => next_fire_at,
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}
