use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::OutcomeLog,
    repositories::{MessageRepository, OutcomeLogRepository},
};

pub struct GetMessageLogsUseCase {
    message_repo: Arc<dyn MessageRepository>,
    outcome_repo: Arc<dyn OutcomeLogRepository>,
}

impl GetMessageLogsUseCase {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        outcome_repo: Arc<dyn OutcomeLogRepository>,
    ) -> Self {
        Self {
            message_repo,
            outcome_repo,
        }
    }

    pub async fn execute(&self, message_id: Uuid) -> Result<Vec<OutcomeLog>, DomainError> {
        if self.message_repo.get(message_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("message {message_id}")));
        }
        Ok(self.outcome_repo.list_by_message(message_id).await?)
    }
}
