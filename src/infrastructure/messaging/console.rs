use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::services::sms::{SendReceipt, SmsTransport},
    domain::{
        models::{SmsProviderConfig, SmsProviderKind},
        value_objects::PhoneNumber,
    },
};

/// Writes messages to the log instead of sending them.
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Arc<dyn SmsTransport> {
        Arc::new(Self) as Arc<dyn SmsTransport>
    }
}

#[async_trait]
impl SmsTransport for ConsoleTransport {
    fn kind(&self) -> SmsProviderKind {
        SmsProviderKind::Console
    }

    async fn send(
        &self,
        config: &SmsProviderConfig,
        to: &PhoneNumber,
        body: &str,
    ) -> anyhow::Result<SendReceipt> {
        let id = format!("console-{}", Uuid::new_v4());
        tracing::info!(
            provider = %config.name,
            sender = config.sender_id.as_deref().unwrap_or("-"),
            %to,
            provider_message_id = %id,
            "[console] {body}"
        );
        Ok(SendReceipt {
            provider_message_id: Some(id),
        })
    }
}
