use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    models::{
        DeliveryStatus, Member, Message, MessageCategory, MessageStatus, NewMessage,
        NewOutcomeLog, OutcomeLog, RecipientSpec, SmsProviderConfig,
    },
    repositories::{MemberDirectory, MessageRepository, OutcomeLogRepository, SmsProviderRepository},
};

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<Uuid, Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a message as-is, replacing any message with the same id.
    pub async fn put(&self, message: Message) {
        let mut messages = self.messages.write().await;
        messages.insert(message.id, message);
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: NewMessage) -> anyhow::Result<Message> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let recipients = message
            .recipients
            .into_iter()
            .map(|spec| RecipientSpec {
                id: Uuid::new_v4(),
                message_id: id,
                kind: spec.kind,
                target_id: spec.target_id,
            })
            .collect();
        let entry = Message {
            id,
            name: message.name,
            body: message.body,
            category: message.category,
            recurrence: message.recurrence,
            next_fire_at: message.next_fire_at,
            recurrence_end_at: message.recurrence_end_at,
            status: message.status,
            last_error: None,
            claimed_at: None,
            recipients,
            created_at: now,
            updated_at: now,
        };
        self.put(entry.clone()).await;
        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages.get(&id).cloned())
    }

    async fn list(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<Message>, bool)> {
        let limit = limit.unwrap_or(50).min(200) as usize;
        let offset = offset.unwrap_or(0) as usize;

        let messages = self.messages.read().await;
        let mut all: Vec<Message> = messages.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let has_more = all.len() > offset + limit;
        Ok((all.into_iter().skip(offset).take(limit).collect(), has_more))
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut due: Vec<Message> = messages
            .values()
            .filter(|m| m.is_due(now, window_start))
            .cloned()
            .collect();
        due.sort_by_key(|m| (m.next_fire_at, m.created_at));
        Ok(due)
    }

    async fn find_birthday(&self) -> anyhow::Result<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut found: Vec<Message> = messages
            .values()
            .filter(|m| m.category == MessageCategory::Birthday && m.status == MessageStatus::Active)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }

    async fn claim(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<Option<Message>> {
        let mut messages = self.messages.write().await;
        match messages.get_mut(&id) {
            Some(message) if message.status.is_claimable() => {
                message.status = MessageStatus::Processing;
                message.claimed_at = Some(now);
                message.updated_at = Utc::now();
                Ok(Some(message.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_schedule(
        &self,
        id: Uuid,
        status: MessageStatus,
        next_fire_at: Option<DateTime<Utc>>,
        last_error: Option<String>,
    ) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        if let Some(message) = messages.get_mut(&id) {
            message.status = status;
            message.next_fire_at = next_fire_at;
            message.last_error = last_error;
            message.claimed_at = None;
            message.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reclaim_stale(
        &self,
        claimed_before: DateTime<Utc>,
        reason: &str,
    ) -> anyhow::Result<Vec<Uuid>> {
        let mut messages = self.messages.write().await;
        let mut reclaimed = Vec::new();
        for message in messages.values_mut() {
            let stale = message.status == MessageStatus::Processing
                && message.claimed_at.is_none_or(|at| at < claimed_before);
            if stale {
                message.status = MessageStatus::Error;
                message.last_error = Some(reason.to_string());
                message.claimed_at = None;
                message.updated_at = Utc::now();
                reclaimed.push(message.id);
            }
        }
        Ok(reclaimed)
    }

    async fn expire_missed(
        &self,
        window_start: DateTime<Utc>,
        reason: &str,
    ) -> anyhow::Result<Vec<Uuid>> {
        let mut messages = self.messages.write().await;
        let mut expired = Vec::new();
        for message in messages.values_mut() {
            let missed = message.category != MessageCategory::Birthday
                && message.status.is_claimable()
                && message.next_fire_at.is_some_and(|at| at <= window_start);
            if missed {
                message.status = MessageStatus::Error;
                message.last_error = Some(reason.to_string());
                message.updated_at = Utc::now();
                expired.push(message.id);
            }
        }
        Ok(expired)
    }

    async fn reopen(
        &self,
        id: Uuid,
        status: MessageStatus,
        next_fire_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Option<Message>> {
        let mut messages = self.messages.write().await;
        match messages.get_mut(&id) {
            Some(message) if message.status.is_terminal() => {
                message.status = status;
                message.next_fire_at = next_fire_at;
                message.last_error = None;
                message.claimed_at = None;
                message.updated_at = Utc::now();
                Ok(Some(message.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct InMemoryOutcomeLogRepository {
    logs: Arc<RwLock<Vec<OutcomeLog>>>,
}

impl InMemoryOutcomeLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<OutcomeLog> {
        self.logs.read().await.clone()
    }
}

#[async_trait]
impl OutcomeLogRepository for InMemoryOutcomeLogRepository {
    async fn append(&self, log: NewOutcomeLog) -> anyhow::Result<OutcomeLog> {
        let entry = OutcomeLog {
            id: Uuid::new_v4(),
            message_id: log.message_id,
            member_id: log.member_id,
            occurrence_at: log.occurrence_at,
            status: log.status,
            provider_message_id: log.provider_message_id,
            error: log.error,
            created_at: Utc::now(),
        };
        self.logs.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn has_sent(
        &self,
        message_id: Uuid,
        member_id: Uuid,
        occurrence_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let logs = self.logs.read().await;
        Ok(logs.iter().any(|log| {
            log.message_id == message_id
                && log.member_id == member_id
                && log.occurrence_at == occurrence_at
                && log.status == DeliveryStatus::Sent
        }))
    }

    async fn list_by_message(&self, message_id: Uuid) -> anyhow::Result<Vec<OutcomeLog>> {
        let logs = self.logs.read().await;
        Ok(logs
            .iter()
            .rev()
            .filter(|log| log.message_id == message_id)
            .cloned()
            .collect())
    }
}

/// Member directory held in memory. Created without a membership table it
/// behaves like a deployment that only has `members.group_id`.
pub struct InMemoryMemberDirectory {
    members: Arc<RwLock<Vec<Member>>>,
    memberships: Option<Arc<RwLock<Vec<(Uuid, Uuid)>>>>,
}

impl Default for InMemoryMemberDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMemberDirectory {
    pub fn new() -> Self {
        Self {
            members: Arc::default(),
            memberships: Some(Arc::default()),
        }
    }

    pub fn without_membership_table() -> Self {
        Self {
            members: Arc::default(),
            memberships: None,
        }
    }

    pub async fn add_member(&self, member: Member) {
        self.members.write().await.push(member);
    }

    pub async fn add_membership(&self, group_id: Uuid, member_id: Uuid) -> anyhow::Result<()> {
        let Some(memberships) = &self.memberships else {
            anyhow::bail!("membership table is not available");
        };
        memberships.write().await.push((group_id, member_id));
        Ok(())
    }
}

#[async_trait]
impl MemberDirectory for InMemoryMemberDirectory {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Member>> {
        let members = self.members.read().await;
        Ok(members.iter().find(|m| m.id == id).cloned())
    }

    async fn members_via_membership(&self, group_id: Uuid) -> anyhow::Result<Option<Vec<Member>>> {
        let Some(memberships) = &self.memberships else {
            return Ok(None);
        };
        let memberships = memberships.read().await;
        let members = self.members.read().await;
        Ok(Some(
            memberships
                .iter()
                .filter(|(group, _)| *group == group_id)
                .filter_map(|(_, member_id)| members.iter().find(|m| m.id == *member_id).cloned())
                .collect(),
        ))
    }

    async fn members_via_group_key(&self, group_id: Uuid) -> anyhow::Result<Vec<Member>> {
        let members = self.members.read().await;
        Ok(members
            .iter()
            .filter(|m| m.group_id == Some(group_id))
            .cloned()
            .collect())
    }

    async fn members_with_birthday(&self, today: NaiveDate) -> anyhow::Result<Vec<Member>> {
        let members = self.members.read().await;
        Ok(members
            .iter()
            .filter(|m| m.has_birthday_on(today))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemorySmsProviderRepository {
    providers: Arc<RwLock<Vec<SmsProviderConfig>>>,
}

impl InMemorySmsProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider. A new default clears the flag on every other one.
    pub async fn add(&self, provider: SmsProviderConfig) {
        let mut providers = self.providers.write().await;
        if provider.is_default {
            for existing in providers.iter_mut() {
                existing.is_default = false;
            }
        }
        providers.push(provider);
    }
}

#[async_trait]
impl SmsProviderRepository for InMemorySmsProviderRepository {
    async fn find_default(&self) -> anyhow::Result<Option<SmsProviderConfig>> {
        let providers = self.providers.read().await;
        Ok(providers.iter().find(|p| p.is_default).cloned())
    }
}
