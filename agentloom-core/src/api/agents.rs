use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::AgentloomResult;
use crate::http::{created_id, unwrap_list, unwrap_object, ApiClient};
use crate::models::{Agent, ConversationSummary};

pub struct AgentsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AgentsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> AgentloomResult<Vec<Agent>> {
        let value: Value = self.client.get("/api/agents").await?;
        unwrap_list(value, "agents")
    }

    pub async fn get(&self, id: &str) -> AgentloomResult<Agent> {
        let value: Value = self.client.get(&format!("/api/agents/{}", id)).await?;
        unwrap_object(value, "agent")
    }

    /// Create an agent and return the id the server assigned.
    pub async fn create<P: Serialize + ?Sized>(&self, payload: &P) -> AgentloomResult<String> {
        let value: Value = self.client.post("/api/agents", payload).await?;
        let id = created_id(&value, "agent")?;
        info!(agent_id = %id, "Created agent");
        Ok(id)
    }

    pub async fn update<P: Serialize + ?Sized>(&self, id: &str, payload: &P) -> AgentloomResult<()> {
        let _: Value = self
            .client
            .put(&format!("/api/agents/{}", id), payload)
            .await?;
        info!(agent_id = %id, "Updated agent");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> AgentloomResult<()> {
        self.client.delete(&format!("/api/agents/{}", id)).await?;
        info!(agent_id = %id, "Deleted agent");
        Ok(())
    }

    pub async fn publish(&self, id: &str) -> AgentloomResult<Agent> {
        let value: Value = self
            .client
            .post_empty(&format!("/api/agents/{}/publish", id))
            .await?;
        unwrap_object(value, "agent")
    }

    pub async fn conversations(&self, id: &str) -> AgentloomResult<Vec<ConversationSummary>> {
        let value: Value = self
            .client
            .get(&format!("/api/agents/{}/conversations", id))
            .await?;
        unwrap_list(value, "conversations")
    }
}
