use chrono::{DateTime, Utc};
use poem_openapi::{ApiResponse, Object, payload::Json};
use uuid::Uuid;

use crate::presentation::models::{
    CycleStatusDto, DeliveryStatusDto, MessageCategoryKind, MessageStatusDto, RecipientKindDto,
    RecurrenceKind,
};

#[derive(Object)]
pub struct RecipientSpecDto {
    pub id: Uuid,
    pub kind: RecipientKindDto,
    pub target_id: Uuid,
}

#[derive(Object)]
pub struct MessageDto {
    pub id: Uuid,
    pub name: String,
    pub body: String,
    pub category: MessageCategoryKind,
    pub recurrence: RecurrenceKind,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub recurrence_end_at: Option<DateTime<Utc>>,
    pub status: MessageStatusDto,
    pub last_error: Option<String>,
    pub recipients: Vec<RecipientSpecDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Object)]
pub struct PaginatedMessagesDto {
    pub messages: Vec<MessageDto>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

#[derive(Object)]
pub struct OutcomeLogDto {
    pub id: Uuid,
    pub message_id: Uuid,
    pub member_id: Uuid,
    pub occurrence_at: DateTime<Utc>,
    pub status: DeliveryStatusDto,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct RecipientResultDto {
    pub member_id: Option<Uuid>,
    pub recipient_spec_id: Option<Uuid>,
    pub phone: Option<String>,
    pub status: DeliveryStatusDto,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct MessageResultDto {
    pub message_id: Uuid,
    pub name: String,
    pub status: CycleStatusDto,
    pub error: Option<String>,
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
    pub recipient_results: Vec<RecipientResultDto>,
}

#[derive(Object, Debug, Default)]
pub struct DispatchTotalsDto {
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
}

#[derive(Object, Debug)]
pub struct DispatchSummaryDto {
    pub success: bool,
    pub processed: u32,
    pub reclaimed: u32,
    pub expired: u32,
    pub totals: DispatchTotalsDto,
    pub results: Vec<MessageResultDto>,
    pub error: Option<String>,
}

impl DispatchSummaryDto {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            processed: 0,
            reclaimed: 0,
            expired: 0,
            totals: DispatchTotalsDto::default(),
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(ApiResponse)]
pub enum RunDispatchResponse {
    /// The cycle ran; individual send failures are in the body.
    #[oai(status = 200)]
    Ok(Json<DispatchSummaryDto>),
    #[oai(status = 401)]
    Unauthorized(Json<DispatchSummaryDto>),
    /// The cycle could not start.
    #[oai(status = 500)]
    Failed(Json<DispatchSummaryDto>),
}
