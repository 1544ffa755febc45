use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::models::{
    Member, Message, MessageStatus, NewMessage, NewOutcomeLog, OutcomeLog, SmsProviderConfig,
};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: NewMessage) -> anyhow::Result<Message>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>>;

    async fn list(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<Message>, bool)>;

    /// Non-birthday messages in `active`/`scheduled` whose next fire time is in
    /// `(window_start, now]`, oldest first.
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Message>>;

    /// Birthday messages currently in `active`.
    async fn find_birthday(&self) -> anyhow::Result<Vec<Message>>;

    /// Moves the message to `processing` only if it is still claimable.
    /// Returns `None` when another run got there first.
    async fn claim(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<Option<Message>>;

    async fn update_schedule(
        &self,
        id: Uuid,
        status: MessageStatus,
        next_fire_at: Option<DateTime<Utc>>,
        last_error: Option<String>,
    ) -> anyhow::Result<()>;

    /// Forces messages claimed before `claimed_before` and still `processing`
    /// into `error`. Returns the ids touched.
    async fn reclaim_stale(
        &self,
        claimed_before: DateTime<Utc>,
        reason: &str,
    ) -> anyhow::Result<Vec<Uuid>>;

    /// Forces non-birthday `active`/`scheduled` messages whose next fire time
    /// is at or before `window_start` into `error`. Returns the ids touched.
    async fn expire_missed(
        &self,
        window_start: DateTime<Utc>,
        reason: &str,
    ) -> anyhow::Result<Vec<Uuid>>;

    /// Reopens a `completed`/`error` message. Returns `None` if the message
    /// was not in a terminal status.
    async fn reopen(
        &self,
        id: Uuid,
        status: MessageStatus,
        next_fire_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Option<Message>>;
}

#[async_trait]
pub trait OutcomeLogRepository: Send + Sync {
    async fn append(&self, log: NewOutcomeLog) -> anyhow::Result<OutcomeLog>;

    /// Whether a `sent` log exists for the pair within the given occurrence.
    async fn has_sent(
        &self,
        message_id: Uuid,
        member_id: Uuid,
        occurrence_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    async fn list_by_message(&self, message_id: Uuid) -> anyhow::Result<Vec<OutcomeLog>>;
}

#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Member>>;

    /// Members linked through the group membership table. `None` when this
    /// deployment has no such table.
    async fn members_via_membership(&self, group_id: Uuid) -> anyhow::Result<Option<Vec<Member>>>;

    /// Members whose own `group_id` column points at the group.
    async fn members_via_group_key(&self, group_id: Uuid) -> anyhow::Result<Vec<Member>>;

    async fn members_with_birthday(&self, today: NaiveDate) -> anyhow::Result<Vec<Member>>;
}

#[async_trait]
pub trait SmsProviderRepository: Send + Sync {
    async fn find_default(&self) -> anyhow::Result<Option<SmsProviderConfig>>;
}
