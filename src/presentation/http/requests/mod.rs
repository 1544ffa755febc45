use chrono::{DateTime, Utc};
use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::{MessageCategoryKind, RecipientKindDto, RecurrenceKind};

#[derive(Object, Debug)]
pub struct RecipientSpecRequestDto {
    pub kind: RecipientKindDto,
    pub target_id: Uuid,
}

#[derive(Object, Debug)]
pub struct CreateMessageRequestDto {
    #[oai(validator(min_length = 1, max_length = 200))]
    pub name: String,
    #[oai(validator(min_length = 1, max_length = 1600))]
    pub body: String,
    pub category: MessageCategoryKind,
    #[oai(default)]
    pub recurrence: RecurrenceKind,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub recurrence_end_at: Option<DateTime<Utc>>,
    #[oai(default)]
    pub recipients: Vec<RecipientSpecRequestDto>,
}

#[derive(Object, Debug, Default)]
pub struct ResetMessageRequestDto {
    pub next_fire_at: Option<DateTime<Utc>>,
}
