use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    errors::DomainError,
    models::{Message, MessageCategory, MessageStatus, NewMessage, NewRecipientSpec, Recurrence},
    repositories::MessageRepository,
};

pub struct ScheduleMessageUseCase {
    message_repo: Arc<dyn MessageRepository>,
}

pub struct ScheduleMessageRequest {
    pub name: String,
    pub body: String,
    pub category: MessageCategory,
    pub recurrence: Recurrence,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub recurrence_end_at: Option<DateTime<Utc>>,
    pub recipients: Vec<NewRecipientSpec>,
}

impl ScheduleMessageUseCase {
    pub fn new(message_repo: Arc<dyn MessageRepository>) -> Self {
        Self { message_repo }
    }

    pub async fn execute(
        &self,
        request: ScheduleMessageRequest,
        now: DateTime<Utc>,
    ) -> Result<Message, DomainError> {
        let message = validate(request, now)?;
        let message = self.message_repo.insert(message).await?;
        tracing::info!(
            message_id = %message.id,
            category = message.category.as_str(),
            status = message.status.as_str(),
            "message scheduled"
        );
        Ok(message)
    }
}

fn validate(request: ScheduleMessageRequest, now: DateTime<Utc>) -> Result<NewMessage, DomainError> {
    let invalid = |reason: &str| Err(DomainError::Validation(reason.to_string()));

    if request.name.trim().is_empty() {
        return invalid("name must not be empty");
    }
    if request.body.trim().is_empty() {
        return invalid("body must not be empty");
    }

    let (next_fire_at, status) = match request.category {
        MessageCategory::Birthday => {
            if request.recurrence != Recurrence::None {
                return invalid("birthday messages cannot carry a recurrence rule");
            }
            (None, MessageStatus::Active)
        }
        category => {
            if category == MessageCategory::OneOff && request.recurrence != Recurrence::None {
                return invalid("one-off messages cannot carry a recurrence rule");
            }
            if category == MessageCategory::RecurringGroup && request.recurrence == Recurrence::None {
                return invalid("recurring messages need a recurrence rule");
            }
            if request.recipients.is_empty() {
                return invalid("at least one recipient is required");
            }
            let Some(next) = request.next_fire_at else {
                return invalid("next_fire_at is required");
            };
            let status = if next > now {
                MessageStatus::Scheduled
            } else {
                MessageStatus::Active
            };
            (Some(next), status)
        }
    };

    if let (Some(next), Some(end)) = (next_fire_at, request.recurrence_end_at) {
        if end < next {
            return invalid("recurrence_end_at must not be before next_fire_at");
        }
    }

    Ok(NewMessage {
        name: request.name.trim().to_string(),
        body: request.body,
        category: request.category,
        recurrence: request.recurrence,
        next_fire_at,
        recurrence_end_at: request.recurrence_end_at,
        status,
        recipients: request.recipients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RecipientKind;
    use chrono::Duration;
    use uuid::Uuid;

    fn request(category: MessageCategory, recurrence: Recurrence) -> ScheduleMessageRequest {
        ScheduleMessageRequest {
            name: "Choir practice".into(),
            body: "Hi {{first_name}}, practice is at 6pm".into(),
            category,
            recurrence,
            next_fire_at: Some(Utc::now() + Duration::hours(2)),
            recurrence_end_at: None,
            recipients: vec![NewRecipientSpec {
                kind: RecipientKind::Group,
                target_id: Uuid::new_v4(),
            }],
        }
    }

    #[test]
    fn future_message_starts_scheduled() {
        let message = validate(request(MessageCategory::OneOff, Recurrence::None), Utc::now()).unwrap();
        assert_eq!(message.status, MessageStatus::Scheduled);
    }

    #[test]
    fn past_message_starts_active() {
        let mut req = request(MessageCategory::RecurringGroup, Recurrence::Weekly);
        req.next_fire_at = Some(Utc::now() - Duration::minutes(5));
        assert_eq!(validate(req, Utc::now()).unwrap().status, MessageStatus::Active);
    }

    #[test]
    fn recurring_requires_rule() {
        let err = validate(request(MessageCategory::RecurringGroup, Recurrence::None), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn birthday_drops_next_fire() {
        let mut req = request(MessageCategory::Birthday, Recurrence::None);
        req.recipients.clear();
        let message = validate(req, Utc::now()).unwrap();
        assert_eq!(message.next_fire_at, None);
        assert_eq!(message.status, MessageStatus::Active);
    }

    #[test]
    fn end_before_next_is_rejected() {
        let mut req = request(MessageCategory::RecurringGroup, Recurrence::Daily);
        req.recurrence_end_at = Some(Utc::now() - Duration::days(1));
        assert!(validate(req, Utc::now()).is_err());
    }
}
