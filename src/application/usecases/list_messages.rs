use std::sync::Arc;

use crate::domain::{models::Message, repositories::MessageRepository};

pub struct ListMessagesResult {
    pub messages: Vec<Message>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

pub struct ListMessagesUseCase {
    repo: Arc<dyn MessageRepository>,
}

impl ListMessagesUseCase {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<ListMessagesResult> {
        let (messages, has_more) = self.repo.list(limit, offset).await?;
        let next_offset = has_more.then(|| offset.unwrap_or(0) + messages.len() as u32);
        Ok(ListMessagesResult {
            messages,
            has_more,
            next_offset,
        })
    }
}
