use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SmsProviderKind {
    Twilio,
    Console,
}

impl SmsProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmsProviderKind::Twilio => "twilio",
            SmsProviderKind::Console => "console",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "twilio" => Some(SmsProviderKind::Twilio),
            "console" => Some(SmsProviderKind::Console),
            _ => None,
        }
    }
}

/// Persisted transport configuration. At most one row is the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsProviderConfig {
    pub id: Uuid,
    pub name: String,
    pub kind: SmsProviderKind,
    pub account_id: Option<String>,
    pub auth_token: Option<String>,
    pub sender_id: Option<String>,
    pub base_url: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl SmsProviderConfig {
    /// Checks the credentials the provider kind needs before anything is sent.
    pub fn validate(&self) -> Result<(), String> {
        if self.kind == SmsProviderKind::Console {
            return Ok(());
        }
        let missing: Vec<&str> = [
            ("account_id", &self.account_id),
            ("auth_token", &self.auth_token),
            ("sender_id", &self.sender_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map(str::trim).unwrap_or("").is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "provider '{}' is missing {}",
                self.name,
                missing.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: SmsProviderKind) -> SmsProviderConfig {
        SmsProviderConfig {
            id: Uuid::new_v4(),
            name: "main".into(),
            kind,
            account_id: None,
            auth_token: None,
            sender_id: None,
            base_url: None,
            is_default: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn console_needs_no_credentials() {
        assert!(config(SmsProviderKind::Console).validate().is_ok());
    }

    #[test]
    fn twilio_lists_missing_credentials() {
        let mut twilio = config(SmsProviderKind::Twilio);
        twilio.account_id = Some("AC123".into());
        twilio.sender_id = Some(" ".into());
        let err = twilio.validate().unwrap_err();
        assert_eq!(err, "provider 'main' is missing auth_token, sender_id");
    }
}
