use chrono::{DateTime, Utc};

use crate::domain::models::{Message, MessageCategory, MessageStatus, Recurrence};

/// Where a message goes once its dispatch cycle is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Reschedule(DateTime<Utc>),
    Complete,
    /// Birthday messages carry no next fire time and go back to `active`.
    Rearm,
    Fail(String),
}

impl Transition {
    pub fn status(&self) -> MessageStatus {
        match self {
            Transition::Reschedule(_) => MessageStatus::Scheduled,
            Transition::Complete => MessageStatus::Completed,
            Transition::Rearm => MessageStatus::Active,
            Transition::Fail(_) => MessageStatus::Error,
        }
    }

    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Transition::Reschedule(next) => Some(*next),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<String> {
        match self {
            Transition::Fail(reason) => Some(reason.clone()),
            _ => None,
        }
    }
}

/// Computes the post-cycle transition for `message` at cycle time `now`.
///
/// The recurrence step is applied to the previous next fire time and repeated
/// until it lands after `now`, so missed occurrences are skipped.
pub fn next_transition(message: &Message, now: DateTime<Utc>) -> Transition {
    if message.category == MessageCategory::Birthday {
        return Transition::Rearm;
    }

    if message.recurrence == Recurrence::None {
        if message.category == MessageCategory::RecurringGroup {
            return Transition::Fail("recurring message has no recurrence rule".to_string());
        }
        return Transition::Complete;
    }

    let Some(mut next) = message.next_fire_at else {
        return Transition::Fail("recurring message has no next fire time".to_string());
    };

    loop {
        next = match message.recurrence.advance(next) {
            Some(advanced) => advanced,
            None => {
                return Transition::Fail(format!(
                    "cannot advance {} recurrence past {next}",
                    message.recurrence.as_str()
                ));
            }
        };
        if next > now {
            break;
        }
    }

    match message.recurrence_end_at {
        Some(end) if next > end => Transition::Complete,
        _ => Transition::Reschedule(next),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap()
    }

    fn message(category: MessageCategory, recurrence: Recurrence, next: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4(),
            name: "Weekly bulletin".into(),
            body: "Hi {{first_name}}".into(),
            category,
            recurrence,
            next_fire_at: Some(next),
            recurrence_end_at: None,
            status: MessageStatus::Processing,
            last_error: None,
            claimed_at: Some(next),
            recipients: vec![],
            created_at: next,
            updated_at: next,
        }
    }

    #[test]
    fn one_off_completes() {
        let m = message(MessageCategory::OneOff, Recurrence::None, at(2024, 3, 1));
        assert_eq!(next_transition(&m, at(2024, 3, 1)), Transition::Complete);
    }

    #[test]
    fn monthly_from_jan_31_lands_on_feb_29() {
        let m = message(MessageCategory::RecurringGroup, Recurrence::Monthly, at(2024, 1, 31));
        assert_eq!(
            next_transition(&m, at(2024, 1, 31)),
            Transition::Reschedule(at(2024, 2, 29))
        );
    }

    #[test]
    fn skips_missed_occurrences() {
        let m = message(MessageCategory::RecurringGroup, Recurrence::Daily, at(2024, 3, 1));
        assert_eq!(
            next_transition(&m, at(2024, 3, 4)),
            Transition::Reschedule(at(2024, 3, 5))
        );
    }

    #[test]
    fn completes_when_next_passes_end() {
        let mut m = message(MessageCategory::RecurringGroup, Recurrence::Weekly, at(2024, 3, 1));
        m.recurrence_end_at = Some(at(2024, 3, 7));
        assert_eq!(next_transition(&m, at(2024, 3, 1)), Transition::Complete);

        m.recurrence_end_at = Some(at(2024, 3, 8));
        assert_eq!(
            next_transition(&m, at(2024, 3, 1)),
            Transition::Reschedule(at(2024, 3, 8))
        );
    }

    #[test]
    fn recurring_without_rule_fails() {
        let m = message(MessageCategory::RecurringGroup, Recurrence::None, at(2024, 3, 1));
        let transition = next_transition(&m, at(2024, 3, 1));
        assert_eq!(transition.status(), MessageStatus::Error);
        assert!(transition.error().unwrap().contains("no recurrence rule"));
    }

    #[test]
    fn overflow_fails() {
        let end_of_time = DateTime::<Utc>::MAX_UTC;
        let m = message(MessageCategory::RecurringGroup, Recurrence::Yearly, end_of_time);
        assert!(matches!(next_transition(&m, end_of_time), Transition::Fail(_)));
    }

    #[test]
    fn birthday_rearms() {
        let m = message(MessageCategory::Birthday, Recurrence::None, at(2024, 3, 1));
        assert_eq!(next_transition(&m, at(2024, 3, 1)), Transition::Rearm);
    }
}
