use serde_json::Value;

use crate::error::AgentloomResult;
use crate::http::{unwrap_object, ApiClient};
use crate::models::Conversation;

pub struct ConversationsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ConversationsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: &str) -> AgentloomResult<Conversation> {
        let value: Value = self
            .client
            .get(&format!("/api/conversations/{}", id))
            .await?;
        unwrap_object(value, "conversation")
    }

    pub async fn delete(&self, id: &str) -> AgentloomResult<()> {
        self.client
            .delete(&format!("/api/conversations/{}", id))
            .await
    }
}
