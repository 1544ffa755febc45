use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::{FromRow, Pool, Postgres};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::domain::{
    models::{
        DeliveryStatus, Member, MemberStatus, Message, MessageCategory, MessageStatus, NewMessage,
        NewOutcomeLog, OutcomeLog, RecipientKind, RecipientSpec, Recurrence, SmsProviderConfig,
        SmsProviderKind,
    },
    repositories::{MemberDirectory, MessageRepository, OutcomeLogRepository, SmsProviderRepository},
};

pub type PgPool = Pool<Postgres>;

const MESSAGE_COLUMNS: &str = "id, name, body, category, recurrence, next_fire_at, \
     recurrence_end_at, status, last_error, claimed_at, created_at, updated_at";

const OUTCOME_LOG_COLUMNS: &str =
    "id, message_id, member_id, occurrence_at, status, provider_message_id, error, created_at";

const MEMBER_COLUMNS: &str = "m.id, m.first_name, m.last_name, m.phone, m.status, m.birth_date, m.group_id";

#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }

    async fn with_recipients(&self, records: Vec<MessageRecord>) -> anyhow::Result<Vec<Message>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let rows = sqlx::query_as::<_, RecipientRecord>(
            r#"
            SELECT id, message_id, kind, target_id
            FROM message_recipients
            WHERE message_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_message: HashMap<Uuid, Vec<RecipientSpec>> = HashMap::new();
        for row in rows {
            let spec = RecipientSpec::try_from(row)?;
            by_message.entry(spec.message_id).or_default().push(spec);
        }

        records
            .into_iter()
            .map(|record| {
                let recipients = by_message.remove(&record.id).unwrap_or_default();
                record.into_message(recipients)
            })
            .collect()
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn insert(&self, message: NewMessage) -> anyhow::Result<Message> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            INSERT INTO messages (
                id, name, body, category, recurrence, next_fire_at, recurrence_end_at,
                status, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&message.name)
        .bind(&message.body)
        .bind(message.category.as_str())
        .bind(message.recurrence.as_str())
        .bind(message.next_fire_at)
        .bind(message.recurrence_end_at)
        .bind(message.status.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut recipients = Vec::with_capacity(message.recipients.len());
        for spec in message.recipients {
            let spec_id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO message_recipients (id, message_id, kind, target_id, created_at)
                VALUES ($1,$2,$3,$4,$5)
                "#,
            )
            .bind(spec_id)
            .bind(id)
            .bind(spec.kind.as_str())
            .bind(spec.target_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            recipients.push(RecipientSpec {
                id: spec_id,
                message_id: id,
                kind: spec.kind,
                target_id: spec.target_id,
            });
        }

        tx.commit().await?;
        record.into_message(recipients)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(self.with_recipients(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<Message>, bool)> {
        let limit = limit.unwrap_or(50).min(200) as i64;
        let offset = offset.unwrap_or(0) as i64;

        // One extra row tells whether another page exists
        let mut records = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit + 1)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let has_more = records.len() > limit as usize;
        records.truncate(limit as usize);
        Ok((self.with_recipients(records).await?, has_more))
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE status = ANY($1)
              AND category <> 'birthday'
              AND next_fire_at IS NOT NULL
              AND next_fire_at > $2
              AND next_fire_at <= $3
            ORDER BY next_fire_at ASC, created_at ASC
            "#
        ))
        .bind(claimable_statuses())
        .bind(window_start)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        self.with_recipients(records).await
    }

    async fn find_birthday(&self) -> anyhow::Result<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE category = 'birthday' AND status = 'active'
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        self.with_recipients(records).await
    }

    async fn claim(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            UPDATE messages
            SET status = 'processing',
                claimed_at = $2,
                updated_at = NOW()
            WHERE id = $1
              AND status = ANY($3)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .bind(claimable_statuses())
        .fetch_optional(&self.pool)
        .await?;

        record.map(|record| record.into_message(Vec::new())).transpose()
    }

    async fn update_schedule(
        &self,
        id: Uuid,
        status: MessageStatus,
        next_fire_at: Option<DateTime<Utc>>,
        last_error: Option<String>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE messages
            SET status = $2,
                next_fire_at = $3,
                last_error = $4,
                claimed_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(next_fire_at)
        .bind(last_error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reclaim_stale(
        &self,
        claimed_before: DateTime<Utc>,
        reason: &str,
    ) -> anyhow::Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE messages
            SET status = 'error',
                last_error = $2,
                claimed_at = NULL,
                updated_at = NOW()
            WHERE status = 'processing'
              AND (claimed_at IS NULL OR claimed_at < $1)
            RETURNING id
            "#,
        )
        .bind(claimed_before)
        .bind(reason)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn expire_missed(
        &self,
        window_start: DateTime<Utc>,
        reason: &str,
    ) -> anyhow::Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE messages
            SET status = 'error',
                last_error = $2,
                updated_at = NOW()
            WHERE status = ANY($3)
              AND category <> 'birthday'
              AND next_fire_at IS NOT NULL
              AND next_fire_at <= $1
            RETURNING id
            "#,
        )
        .bind(window_start)
        .bind(reason)
        .bind(claimable_statuses())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn reopen(
        &self,
        id: Uuid,
        status: MessageStatus,
        next_fire_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            UPDATE messages
            SET status = $2,
                next_fire_at = $3,
                last_error = NULL,
                claimed_at = NULL,
                updated_at = NOW()
            WHERE id = $1
              AND status IN ('completed', 'error')
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(next_fire_at)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(self.with_recipients(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[derive(Clone)]
pub struct PostgresOutcomeLogRepository {
    pool: PgPool,
}

impl PostgresOutcomeLogRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl OutcomeLogRepository for PostgresOutcomeLogRepository {
    async fn append(&self, log: NewOutcomeLog) -> anyhow::Result<OutcomeLog> {
        let record = sqlx::query_as::<_, OutcomeLogRecord>(&format!(
            r#"
            INSERT INTO outcome_logs (
                id, message_id, member_id, occurrence_at, status, provider_message_id,
                error, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING {OUTCOME_LOG_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(log.message_id)
        .bind(log.member_id)
        .bind(log.occurrence_at)
        .bind(log.status.as_str())
        .bind(&log.provider_message_id)
        .bind(&log.error)
        .fetch_one(&self.pool)
        .await?;
        record.try_into()
    }

    async fn has_sent(
        &self,
        message_id: Uuid,
        member_id: Uuid,
        occurrence_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM outcome_logs
                WHERE message_id = $1
                  AND member_id = $2
                  AND occurrence_at = $3
                  AND status = 'sent'
            )
            "#,
        )
        .bind(message_id)
        .bind(member_id)
        .bind(occurrence_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_by_message(&self, message_id: Uuid) -> anyhow::Result<Vec<OutcomeLog>> {
        let rows = sqlx::query_as::<_, OutcomeLogRecord>(&format!(
            r#"
            SELECT {OUTCOME_LOG_COLUMNS}
            FROM outcome_logs
            WHERE message_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(OutcomeLog::try_from).collect()
    }
}

/// Reads the member tables. Whether `group_members` exists is checked once
/// per process.
pub struct PostgresMemberDirectory {
    pool: PgPool,
    membership_table: OnceCell<bool>,
}

impl PostgresMemberDirectory {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self {
            pool,
            membership_table: OnceCell::new(),
        })
    }

    async fn has_membership_table(&self) -> anyhow::Result<bool> {
        let present = self
            .membership_table
            .get_or_try_init(|| async {
                let present = sqlx::query_scalar::<_, bool>(
                    "SELECT to_regclass('public.group_members') IS NOT NULL",
                )
                .fetch_one(&self.pool)
                .await?;
                tracing::info!(present, "group membership table probed");
                Ok::<_, sqlx::Error>(present)
            })
            .await?;
        Ok(*present)
    }
}

#[async_trait]
impl MemberDirectory for PostgresMemberDirectory {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Member>> {
        let record = sqlx::query_as::<_, MemberRecord>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members m WHERE m.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(Member::try_from).transpose()
    }

    async fn members_via_membership(&self, group_id: Uuid) -> anyhow::Result<Option<Vec<Member>>> {
        if !self.has_membership_table().await? {
            return Ok(None);
        }
        let rows = sqlx::query_as::<_, MemberRecord>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS}
            FROM group_members gm
            JOIN members m ON m.id = gm.member_id
            WHERE gm.group_id = $1
            ORDER BY m.last_name ASC, m.first_name ASC, m.id ASC
            "#
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(Member::try_from)
            .collect::<anyhow::Result<Vec<_>>>()
            .map(Some)
    }

    async fn members_via_group_key(&self, group_id: Uuid) -> anyhow::Result<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRecord>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS}
            FROM members m
            WHERE m.group_id = $1
            ORDER BY m.last_name ASC, m.first_name ASC, m.id ASC
            "#
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Member::try_from).collect()
    }

    async fn members_with_birthday(&self, today: NaiveDate) -> anyhow::Result<Vec<Member>> {
        // Filtered by month here, by day in `has_birthday_on` to cover 29 February.
        let rows = sqlx::query_as::<_, MemberRecord>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS}
            FROM members m
            WHERE m.birth_date IS NOT NULL
              AND EXTRACT(MONTH FROM m.birth_date)::int = $1
            ORDER BY m.last_name ASC, m.first_name ASC, m.id ASC
            "#
        ))
        .bind(today.month() as i32)
        .fetch_all(&self.pool)
        .await?;

        let mut members = Vec::with_capacity(rows.len());
        for row in rows {
            let member = Member::try_from(row)?;
            if member.has_birthday_on(today) {
                members.push(member);
            }
        }
        Ok(members)
    }
}

#[derive(Clone)]
pub struct PostgresSmsProviderRepository {
    pool: PgPool,
}

impl PostgresSmsProviderRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl SmsProviderRepository for PostgresSmsProviderRepository {
    async fn find_default(&self) -> anyhow::Result<Option<SmsProviderConfig>> {
        let record = sqlx::query_as::<_, SmsProviderRecord>(
            r#"
            SELECT id, name, kind, account_id, auth_token, sender_id, base_url, is_default, created_at
            FROM sms_providers
            WHERE is_default
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        record.map(SmsProviderConfig::try_from).transpose()
    }
}

fn claimable_statuses() -> Vec<&'static str> {
    MessageStatus::CLAIMABLE.iter().map(MessageStatus::as_str).collect()
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    name: String,
    body: String,
    category: String,
    recurrence: String,
    next_fire_at: Option<DateTime<Utc>>,
    recurrence_end_at: Option<DateTime<Utc>>,
    status: String,
    last_error: Option<String>,
    claimed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MessageRecord {
    fn into_message(self, recipients: Vec<RecipientSpec>) -> anyhow::Result<Message> {
        let category = MessageCategory::from_str(&self.category)
            .ok_or_else(|| anyhow::anyhow!("unknown message category {}", self.category))?;
        let recurrence = Recurrence::from_str(&self.recurrence)
            .ok_or_else(|| anyhow::anyhow!("unknown recurrence {}", self.recurrence))?;
        let status = MessageStatus::from_str(&self.status)
            .ok_or_else(|| anyhow::anyhow!("unknown message status {}", self.status))?;

        Ok(Message {
            id: self.id,
            name: self.name,
            body: self.body,
            category,
            recurrence,
            next_fire_at: self.next_fire_at,
            recurrence_end_at: self.recurrence_end_at,
            status,
            last_error: self.last_error,
            claimed_at: self.claimed_at,
            recipients,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct RecipientRecord {
    id: Uuid,
    message_id: Uuid,
    kind: String,
    target_id: Uuid,
}

impl TryFrom<RecipientRecord> for RecipientSpec {
    type Error = anyhow::Error;

    fn try_from(value: RecipientRecord) -> Result<Self, Self::Error> {
        let kind = RecipientKind::from_str(&value.kind)
            .ok_or_else(|| anyhow::anyhow!("unknown recipient kind {}", value.kind))?;
        Ok(Self {
            id: value.id,
            message_id: value.message_id,
            kind,
            target_id: value.target_id,
        })
    }
}

#[derive(FromRow)]
struct OutcomeLogRecord {
    id: Uuid,
    message_id: Uuid,
    member_id: Uuid,
    occurrence_at: DateTime<Utc>,
    status: String,
    provider_message_id: Option<String>,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OutcomeLogRecord> for OutcomeLog {
    type Error = anyhow::Error;

    fn try_from(value: OutcomeLogRecord) -> Result<Self, Self::Error> {
        let status = DeliveryStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown delivery status {}", value.status))?;
        Ok(Self {
            id: value.id,
            message_id: value.message_id,
            member_id: value.member_id,
            occurrence_at: value.occurrence_at,
            status,
            provider_message_id: value.provider_message_id,
            error: value.error,
            created_at: value.created_at,
        })
    }
}

#[derive(FromRow)]
struct MemberRecord {
    id: Uuid,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    status: String,
    birth_date: Option<NaiveDate>,
    group_id: Option<Uuid>,
}

impl TryFrom<MemberRecord> for Member {
    type Error = anyhow::Error;

    fn try_from(value: MemberRecord) -> Result<Self, Self::Error> {
        let status = MemberStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown member status {}", value.status))?;
        Ok(Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            phone: value.phone,
            status,
            birth_date: value.birth_date,
            group_id: value.group_id,
        })
    }
}

#[derive(FromRow)]
struct SmsProviderRecord {
    id: Uuid,
    name: String,
    kind: String,
    account_id: Option<String>,
    auth_token: Option<String>,
    sender_id: Option<String>,
    base_url: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<SmsProviderRecord> for SmsProviderConfig {
    type Error = anyhow::Error;

    fn try_from(value: SmsProviderRecord) -> Result<Self, Self::Error> {
        let kind = SmsProviderKind::from_str(&value.kind)
            .ok_or_else(|| anyhow::anyhow!("unknown sms provider kind {}", value.kind))?;
        Ok(Self {
            id: value.id,
            name: value.name,
            kind,
            account_id: value.account_id,
            auth_token: value.auth_token,
            sender_id: value.sender_id,
            base_url: value.base_url,
            is_default: value.is_default,
            created_at: value.created_at,
        })
    }
}
