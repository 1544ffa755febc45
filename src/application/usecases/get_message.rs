use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{errors::DomainError, models::Message, repositories::MessageRepository};

pub struct GetMessageUseCase {
    repo: Arc<dyn MessageRepository>,
}

impl GetMessageUseCase {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, message_id: Uuid) -> Result<Message, DomainError> {
        self.repo
            .get(message_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("message {message_id}")))
    }
}
