use std::sync::Arc;

use chrono::Utc;
use poem::{Result as PoemResult, http::StatusCode};
use poem_openapi::{
    OpenApi,
    param::{Path, Query},
    payload::Json,
};
use uuid::Uuid;

use crate::{
    application::usecases::{
        reset_message::ResetMessageRequest, schedule_message::ScheduleMessageRequest,
    },
    domain::{errors::DomainError, models::NewRecipientSpec},
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{map_message, map_outcome_log},
        requests::{CreateMessageRequestDto, ResetMessageRequestDto},
        responses::{MessageDto, OutcomeLogDto, PaginatedMessagesDto},
        security::AdminAuth,
    },
};

#[derive(Clone)]
pub struct MessagesEndpoints {
    state: Arc<ApiState>,
}

impl MessagesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl MessagesEndpoints {
    #[oai(path = "/messages", method = "post", tag = EndpointsTags::Messages)]
    pub async fn create_message(
        &self,
        auth: AdminAuth,
        request: Json<CreateMessageRequestDto>,
    ) -> PoemResult<Json<MessageDto>> {
        auth.verify(&self.state.admin_token)?;
        let request = request.0;
        let payload = ScheduleMessageRequest {
            name: request.name,
            body: request.body,
            category: request.category.into(),
            recurrence: request.recurrence.into(),
            next_fire_at: request.next_fire_at,
            recurrence_end_at: request.recurrence_end_at,
            recipients: request
                .recipients
                .into_iter()
                .map(|spec| NewRecipientSpec {
                    kind: spec.kind.into(),
                    target_id: spec.target_id,
                })
                .collect(),
        };

        let message = self
            .state
            .schedule_message_usecase
            .execute(payload, Utc::now())
            .await
            .map_err(domain_error)?;

        Ok(Json(map_message(&message)))
    }

    #[oai(path = "/messages", method = "get", tag = EndpointsTags::Messages)]
    pub async fn list_messages(
        &self,
        auth: AdminAuth,
        limit: Query<Option<u32>>,
        offset: Query<Option<u32>>,
    ) -> PoemResult<Json<PaginatedMessagesDto>> {
        auth.verify(&self.state.admin_token)?;

        let result = self
            .state
            .list_messages_usecase
            .execute(limit.0, offset.0)
            .await
            .map_err(internal_error)?;

        Ok(Json(PaginatedMessagesDto {
            messages: result.messages.iter().map(map_message).collect(),
            has_more: result.has_more,
            next_offset: result.next_offset,
        }))
    }

    #[oai(path = "/messages/:message_id", method = "get", tag = EndpointsTags::Messages)]
    pub async fn get_message(
        &self,
        auth: AdminAuth,
        message_id: Path<Uuid>,
    ) -> PoemResult<Json<MessageDto>> {
        auth.verify(&self.state.admin_token)?;

        let message = self
            .state
            .get_message_usecase
            .execute(message_id.0)
            .await
            .map_err(domain_error)?;

        Ok(Json(map_message(&message)))
    }

    #[oai(path = "/messages/:message_id/logs", method = "get", tag = EndpointsTags::Messages)]
    pub async fn get_message_logs(
        &self,
        auth: AdminAuth,
        message_id: Path<Uuid>,
    ) -> PoemResult<Json<Vec<OutcomeLogDto>>> {
        auth.verify(&self.state.admin_token)?;

        let logs = self
            .state
            .get_message_logs_usecase
            .execute(message_id.0)
            .await
            .map_err(domain_error)?;

        Ok(Json(logs.iter().map(map_outcome_log).collect()))
    }

    #[oai(
        path = "/messages/:message_id/actions/reset",
        method = "post",
        tag = EndpointsTags::Messages,
    )]
    pub async fn reset_message(
        &self,
        auth: AdminAuth,
        message_id: Path<Uuid>,
        request: Json<ResetMessageRequestDto>,
    ) -> PoemResult<Json<MessageDto>> {
        auth.verify(&self.state.admin_token)?;

        let message = self
            .state
            .reset_message_usecase
            .execute(
                ResetMessageRequest {
                    message_id: message_id.0,
                    next_fire_at: request.next_fire_at,
                },
                Utc::now(),
            )
            .await
            .map_err(domain_error)?;

        Ok(Json(map_message(&message)))
    }
}

fn domain_error(err: DomainError) -> poem::Error {
    let status = match &err {
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Other(_) => {
            tracing::error!(error = %err, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    poem::Error::from_string(err.to_string(), status)
}

fn internal_error(err: anyhow::Error) -> poem::Error {
    tracing::error!(error = %err, "request failed");
    poem::Error::from_string(err.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
}
