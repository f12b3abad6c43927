use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::AgentloomResult;
use crate::http::{created_id, unwrap_list, unwrap_object, ApiClient};
use crate::models::{Document, ScrapeRequest, TableEntry, TextEntry, Tool};

pub struct ToolsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ToolsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> AgentloomResult<Vec<Tool>> {
        let value: Value = self.client.get("/api/tools").await?;
        unwrap_list(value, "tools")
    }

    pub async fn get(&self, id: &str) -> AgentloomResult<Tool> {
        let value: Value = self.client.get(&format!("/api/tools/{}", id)).await?;
        unwrap_object(value, "tool")
    }

    /// Create a tool, aborting the request once `timeout` elapses.
    pub async fn create<P: Serialize + ?Sized>(
        &self,
        payload: &P,
        timeout: Duration,
    ) -> AgentloomResult<String> {
        let value: Value = self
            .client
            .post_with_timeout("/api/tools", payload, timeout)
            .await?;
        let id = created_id(&value, "tool")?;
        info!(tool_id = %id, "Created tool");
        Ok(id)
    }

    pub async fn update<P: Serialize + ?Sized>(&self, id: &str, payload: &P) -> AgentloomResult<()> {
        let _: Value = self
            .client
            .put(&format!("/api/tools/{}", id), payload)
            .await?;
        info!(tool_id = %id, "Updated tool");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> AgentloomResult<()> {
        self.client.delete(&format!("/api/tools/{}", id)).await?;
        info!(tool_id = %id, "Deleted tool");
        Ok(())
    }

    /// Run the server-side connectivity check of a tool.
    pub async fn test(&self, id: &str) -> AgentloomResult<Value> {
        self.client
            .post_empty(&format!("/api/tools/{}/test", id))
            .await
    }

    pub async fn scrape(&self, id: &str, request: &ScrapeRequest) -> AgentloomResult<Value> {
        self.client
            .post(&format!("/api/tools/{}/scrape", id), request)
            .await
    }

    pub async fn upload_document(&self, id: &str, file: &Path) -> AgentloomResult<Value> {
        self.client
            .upload_file(&format!("/api/tools/{}/documents", id), file)
            .await
    }

    pub async fn add_text_entry(&self, id: &str, entry: &TextEntry) -> AgentloomResult<Value> {
        self.client
            .post(&format!("/api/tools/{}/entries", id), entry)
            .await
    }

    pub async fn add_table(&self, id: &str, table: &TableEntry) -> AgentloomResult<Value> {
        self.client
            .post(&format!("/api/tools/{}/tables", id), table)
            .await
    }

    pub async fn documents(&self, id: &str) -> AgentloomResult<Vec<Document>> {
        let value: Value = self
            .client
            .get(&format!("/api/tools/{}/documents", id))
            .await?;
        unwrap_list(value, "documents")
    }
}
