#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use sms_dispatch::{
    application::{
        handlers::message_dispatcher::MessageDispatchHandler,
        services::sms::{SendReceipt, SmsGateway, SmsTransport},
        usecases::run_dispatch_cycle::{DispatchCycleConfig, RunDispatchCycleUseCase},
    },
    domain::{
        models::{
            Member, MemberStatus, Message, MessageCategory, MessageStatus, RecipientKind,
            RecipientSpec, Recurrence, SmsProviderConfig, SmsProviderKind,
        },
        value_objects::PhoneNumber,
    },
    infrastructure::repositories::in_memory::{
        InMemoryMemberDirectory, InMemoryMessageRepository, InMemoryOutcomeLogRepository,
        InMemorySmsProviderRepository,
    },
};

#[derive(Debug, Clone)]
pub struct SentSms {
    pub to: String,
    pub body: String,
}

/// Transport that records every send and fails for chosen numbers.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<SentSms>>,
    pub failing: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub async fn fail_for(&self, number: &str) {
        self.failing.lock().await.insert(number.to_string());
    }

    pub async fn sent(&self) -> Vec<SentSms> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl SmsTransport for RecordingTransport {
    fn kind(&self) -> SmsProviderKind {
        SmsProviderKind::Console
    }

    async fn send(
        &self,
        _config: &SmsProviderConfig,
        to: &PhoneNumber,
        body: &str,
    ) -> anyhow::Result<SendReceipt> {
        if self.failing.lock().await.contains(to.as_str()) {
            anyhow::bail!("provider rejected {to}");
        }
        let mut sent = self.sent.lock().await;
        sent.push(SentSms {
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(SendReceipt {
            provider_message_id: Some(format!("test-{}", sent.len())),
        })
    }
}

pub struct Harness {
    pub messages: Arc<InMemoryMessageRepository>,
    pub outcomes: Arc<InMemoryOutcomeLogRepository>,
    pub members: Arc<InMemoryMemberDirectory>,
    pub providers: Arc<InMemorySmsProviderRepository>,
    pub transport: Arc<RecordingTransport>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_directory(InMemoryMemberDirectory::new()).await
    }

    pub async fn with_directory(directory: InMemoryMemberDirectory) -> Self {
        let harness = Self::without_provider(directory);
        harness.providers.add(console_provider()).await;
        harness
    }

    pub fn without_provider(directory: InMemoryMemberDirectory) -> Self {
        Self {
            messages: Arc::new(InMemoryMessageRepository::new()),
            outcomes: Arc::new(InMemoryOutcomeLogRepository::new()),
            members: Arc::new(directory),
            providers: Arc::new(InMemorySmsProviderRepository::new()),
            transport: Arc::new(RecordingTransport::default()),
        }
    }

    pub fn cycle(&self) -> RunDispatchCycleUseCase {
        RunDispatchCycleUseCase::new(
            self.messages.clone(),
            self.providers.clone(),
            self.members.clone(),
            MessageDispatchHandler::new(self.outcomes.clone()),
            SmsGateway::new(vec![self.transport.clone() as Arc<dyn SmsTransport>]),
            DispatchCycleConfig::default(),
        )
    }

    pub fn dispatcher(&self) -> MessageDispatchHandler {
        MessageDispatchHandler::new(self.outcomes.clone())
    }
}

pub fn console_provider() -> SmsProviderConfig {
    SmsProviderConfig {
        id: Uuid::new_v4(),
        name: "test".into(),
        kind: SmsProviderKind::Console,
        account_id: None,
        auth_token: None,
        sender_id: Some("CHURCH".into()),
        base_url: None,
        is_default: true,
        created_at: Utc::now(),
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn member(first_name: &str, phone: Option<&str>, status: MemberStatus) -> Member {
    Member {
        id: Uuid::new_v4(),
        first_name: first_name.into(),
        last_name: "Owusu".into(),
        phone: phone.map(str::to_string),
        status,
        birth_date: None,
        group_id: None,
    }
}

pub fn born(mut member: Member, y: i32, m: u32, d: u32) -> Member {
    member.birth_date = NaiveDate::from_ymd_opt(y, m, d);
    member
}

pub fn message(
    category: MessageCategory,
    recurrence: Recurrence,
    next_fire_at: Option<DateTime<Utc>>,
    targets: &[(RecipientKind, Uuid)],
) -> Message {
    let id = Uuid::new_v4();
    Message {
        id,
        name: "Announcement".into(),
        body: "Hello {{first_name}}, see you Sunday {{venue}}".into(),
        category,
        recurrence,
        next_fire_at,
        recurrence_end_at: None,
        status: if category == MessageCategory::Birthday {
            MessageStatus::Active
        } else {
            MessageStatus::Scheduled
        },
        last_error: None,
        claimed_at: None,
        recipients: targets
            .iter()
            .map(|(kind, target_id)| RecipientSpec {
                id: Uuid::new_v4(),
                message_id: id,
                kind: *kind,
                target_id: *target_id,
            })
            .collect(),
        created_at: at(2024, 1, 1, 0),
        updated_at: at(2024, 1, 1, 0),
    }
}
