use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    models::{SmsProviderConfig, SmsProviderKind},
    value_objects::PhoneNumber,
};

/// What the provider handed back for an accepted message.
#[derive(Debug, Clone, Default)]
pub struct SendReceipt {
    pub provider_message_id: Option<String>,
}

#[async_trait]
pub trait SmsTransport: Send + Sync {
    fn kind(&self) -> SmsProviderKind;

    /// Sends `body` to `to`. An `Err` means the provider did not accept it;
    /// its text is recorded on the outcome log.
    async fn send(
        &self,
        config: &SmsProviderConfig,
        to: &PhoneNumber,
        body: &str,
    ) -> anyhow::Result<SendReceipt>;
}

#[derive(Clone)]
pub struct SmsGateway {
    transports: HashMap<SmsProviderKind, Arc<dyn SmsTransport>>,
}

impl SmsGateway {
    pub fn new(transports: Vec<Arc<dyn SmsTransport>>) -> Self {
        let mut map = HashMap::new();
        for transport in transports {
            map.insert(transport.kind(), transport);
        }
        Self { transports: map }
    }

    pub fn get(&self, kind: SmsProviderKind) -> Option<Arc<dyn SmsTransport>> {
        self.transports.get(&kind).cloned()
    }
}
