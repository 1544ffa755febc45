use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    application::services::sms::{SendReceipt, SmsTransport},
    domain::{
        models::{SmsProviderConfig, SmsProviderKind},
        value_objects::PhoneNumber,
    },
};

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

pub struct TwilioTransport {
    http: Client,
}

impl TwilioTransport {
    pub fn new() -> anyhow::Result<Arc<dyn SmsTransport>> {
        let http = Client::builder()
            .user_agent("sms-dispatch/twilio")
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build twilio client")?;
        Ok(Arc::new(Self { http }) as Arc<dyn SmsTransport>)
    }

    fn messages_url(config: &SmsProviderConfig, account_id: &str) -> String {
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{base}/2010-04-01/Accounts/{account_id}/Messages.json")
    }
}

#[async_trait]
impl SmsTransport for TwilioTransport {
    fn kind(&self) -> SmsProviderKind {
        SmsProviderKind::Twilio
    }

    async fn send(
        &self,
        config: &SmsProviderConfig,
        to: &PhoneNumber,
        body: &str,
    ) -> anyhow::Result<SendReceipt> {
        let (Some(account_id), Some(auth_token), Some(sender_id)) = (
            config.account_id.as_deref(),
            config.auth_token.as_deref(),
            config.sender_id.as_deref(),
        ) else {
            anyhow::bail!("twilio provider '{}' is missing credentials", config.name);
        };

        let response = self
            .http
            .post(Self::messages_url(config, account_id))
            .basic_auth(account_id, Some(auth_token))
            .form(&[("To", to.as_str()), ("From", sender_id), ("Body", body)])
            .send()
            .await
            .context("twilio request failed")?;

        let status = response.status();
        let payload: TwilioMessageResponse = response
            .json()
            .await
            .with_context(|| format!("twilio returned unreadable response ({status})"))?;

        if !status.is_success() {
            anyhow::bail!(
                "twilio rejected message ({status}): {}",
                payload
                    .message
                    .or(payload.error_message)
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        if let Some(error) = payload.error_message {
            anyhow::bail!("twilio rejected message: {error}");
        }

        Ok(SendReceipt {
            provider_message_id: payload.sid,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: Option<String>,
    error_message: Option<String>,
    /// Present on error responses.
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn config(base_url: Option<&str>) -> SmsProviderConfig {
        SmsProviderConfig {
            id: Uuid::new_v4(),
            name: "twilio".into(),
            kind: SmsProviderKind::Twilio,
            account_id: Some("AC1".into()),
            auth_token: Some("secret".into()),
            sender_id: Some("CHURCH".into()),
            base_url: base_url.map(str::to_string),
            is_default: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn builds_messages_url() {
        assert_eq!(
            TwilioTransport::messages_url(&config(None), "AC1"),
            "https://api.twilio.com/2010-04-01/Accounts/AC1/Messages.json"
        );
        assert_eq!(
            TwilioTransport::messages_url(&config(Some("http://localhost:4010/")), "AC1"),
            "http://localhost:4010/2010-04-01/Accounts/AC1/Messages.json"
        );
    }

    #[test]
    fn parses_error_payload() {
        let payload: TwilioMessageResponse = serde_json::from_str(
            r#"{"code":21211,"message":"Invalid 'To' Phone Number","status":400}"#,
        )
        .unwrap();
        assert_eq!(payload.message.as_deref(), Some("Invalid 'To' Phone Number"));
        assert!(payload.sid.is_none());
    }
}
