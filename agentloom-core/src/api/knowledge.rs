use serde_json::Value;
use tracing::info;

use crate::error::AgentloomResult;
use crate::http::{unwrap_list, unwrap_object, ApiClient};
use crate::models::{Document, Tool};

/// Read-mostly view over knowledge-bearing tools and their documents.
pub struct KnowledgeApi<'a> {
    client: &'a ApiClient,
}

impl<'a> KnowledgeApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn bases(&self) -> AgentloomResult<Vec<Tool>> {
        let value: Value = self.client.get("/api/knowledge").await?;
        unwrap_list(value, "knowledge_bases")
    }

    pub async fn documents(&self, tool_id: &str) -> AgentloomResult<Vec<Document>> {
        let value: Value = self
            .client
            .get(&format!("/api/tools/{}/documents", tool_id))
            .await?;
        unwrap_list(value, "documents")
    }

    pub async fn document(&self, tool_id: &str, document_id: &str) -> AgentloomResult<Document> {
        let value: Value = self
            .client
            .get(&format!("/api/tools/{}/documents/{}", tool_id, document_id))
            .await?;
        unwrap_object(value, "document")
    }

    pub async fn delete_document(&self, tool_id: &str, document_id: &str) -> AgentloomResult<()> {
        self.client
            .delete(&format!("/api/tools/{}/documents/{}", tool_id, document_id))
            .await?;
        info!(tool_id, document_id, "Deleted document");
        Ok(())
    }
}
