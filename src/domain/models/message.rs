use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::recipient::RecipientSpec;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    OneOff,
    RecurringGroup,
    Birthday,
}

impl MessageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageCategory::OneOff => "one_off",
            MessageCategory::RecurringGroup => "recurring_group",
            MessageCategory::Birthday => "birthday",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "one_off" => Some(MessageCategory::OneOff),
            "recurring_group" => Some(MessageCategory::RecurringGroup),
            "birthday" => Some(MessageCategory::Birthday),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Yearly => "yearly",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Recurrence::None),
            "daily" => Some(Recurrence::Daily),
            "weekly" => Some(Recurrence::Weekly),
            "monthly" => Some(Recurrence::Monthly),
            "yearly" => Some(Recurrence::Yearly),
            _ => None,
        }
    }

    /// Applies one recurrence step to `from`.
    ///
    /// Month and year steps use calendar arithmetic and clamp to the last day
    /// of the target month, so 2024-01-31 monthly lands on 2024-02-29 and
    /// 2024-02-29 yearly lands on 2025-02-28. Returns `None` for
    /// [`Recurrence::None`] and when the result is out of range.
    pub fn advance(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Recurrence::None => None,
            Recurrence::Daily => from.checked_add_days(Days::new(1)),
            Recurrence::Weekly => from.checked_add_days(Days::new(7)),
            Recurrence::Monthly => from.checked_add_months(Months::new(1)),
            Recurrence::Yearly => from.checked_add_months(Months::new(12)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Active,
    Scheduled,
    Processing,
    Completed,
    Error,
}

impl MessageStatus {
    /// Statuses the selector and the claim accept.
    pub const CLAIMABLE: [MessageStatus; 2] = [MessageStatus::Active, MessageStatus::Scheduled];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Active => "active",
            MessageStatus::Scheduled => "scheduled",
            MessageStatus::Processing => "processing",
            MessageStatus::Completed => "completed",
            MessageStatus::Error => "error",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "active" => Some(MessageStatus::Active),
            "scheduled" => Some(MessageStatus::Scheduled),
            "processing" => Some(MessageStatus::Processing),
            "completed" => Some(MessageStatus::Completed),
            "error" => Some(MessageStatus::Error),
            _ => None,
        }
    }

    pub fn is_claimable(&self) -> bool {
        Self::CLAIMABLE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Completed | MessageStatus::Error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub name: String,
    pub body: String,
    pub category: MessageCategory,
    pub recurrence: Recurrence,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub recurrence_end_at: Option<DateTime<Utc>>,
    pub status: MessageStatus,
    pub last_error: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub recipients: Vec<RecipientSpec>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// True when the message belongs in the due set for a cycle running at
    /// `now` with the given look-back window start.
    pub fn is_due(&self, now: DateTime<Utc>, window_start: DateTime<Utc>) -> bool {
        if self.category == MessageCategory::Birthday || !self.status.is_claimable() {
            return false;
        }
        match self.next_fire_at {
            Some(next) => next > window_start && next <= now,
            None => false,
        }
    }
}

/// Write model for a message together with its recipient specs.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub name: String,
    pub body: String,
    pub category: MessageCategory,
    pub recurrence: Recurrence,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub recurrence_end_at: Option<DateTime<Utc>>,
    pub status: MessageStatus,
    pub recipients: Vec<super::recipient::NewRecipientSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn message(status: MessageStatus, next: Option<DateTime<Utc>>) -> Message {
        Message {
            id: Uuid::new_v4(),
            name: "Sunday reminder".into(),
            body: "See you at service".into(),
            category: MessageCategory::OneOff,
            recurrence: Recurrence::None,
            next_fire_at: next,
            recurrence_end_at: None,
            status,
            last_error: None,
            claimed_at: None,
            recipients: vec![],
            created_at: at(2024, 1, 1),
            updated_at: at(2024, 1, 1),
        }
    }

    #[test]
    fn monthly_clamps_to_end_of_short_month() {
        assert_eq!(Recurrence::Monthly.advance(at(2024, 1, 31)), Some(at(2024, 2, 29)));
        assert_eq!(Recurrence::Monthly.advance(at(2023, 1, 31)), Some(at(2023, 2, 28)));
        assert_eq!(Recurrence::Monthly.advance(at(2024, 3, 31)), Some(at(2024, 4, 30)));
    }

    #[test]
    fn yearly_from_leap_day_lands_on_feb_28() {
        assert_eq!(Recurrence::Yearly.advance(at(2024, 2, 29)), Some(at(2025, 2, 28)));
        assert_eq!(Recurrence::Yearly.advance(at(2024, 6, 15)), Some(at(2025, 6, 15)));
    }

    #[test]
    fn daily_and_weekly_cross_month_boundaries() {
        assert_eq!(Recurrence::Daily.advance(at(2024, 2, 28)), Some(at(2024, 2, 29)));
        assert_eq!(Recurrence::Weekly.advance(at(2024, 12, 28)), Some(at(2025, 1, 4)));
        assert_eq!(Recurrence::None.advance(at(2024, 1, 1)), None);
    }

    #[test]
    fn due_only_inside_window_and_claimable() {
        let now = at(2024, 5, 10);
        let window_start = now - chrono::Duration::hours(24);

        assert!(message(MessageStatus::Active, Some(now)).is_due(now, window_start));
        assert!(
            message(MessageStatus::Scheduled, Some(now - chrono::Duration::hours(3)))
                .is_due(now, window_start)
        );
        assert!(!message(MessageStatus::Active, Some(now + chrono::Duration::minutes(1)))
            .is_due(now, window_start));
        assert!(!message(MessageStatus::Active, Some(window_start)).is_due(now, window_start));
        assert!(!message(MessageStatus::Completed, Some(now)).is_due(now, window_start));
        assert!(!message(MessageStatus::Processing, Some(now)).is_due(now, window_start));
        assert!(!message(MessageStatus::Active, None).is_due(now, window_start));
    }

    #[test]
    fn birthday_messages_are_never_due() {
        let now = at(2024, 5, 10);
        let mut birthday = message(MessageStatus::Active, Some(now));
        birthday.category = MessageCategory::Birthday;
        assert!(!birthday.is_due(now, now - chrono::Duration::hours(24)));
    }
}
