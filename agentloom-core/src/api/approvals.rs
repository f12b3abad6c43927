use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::AgentloomResult;
use crate::http::{unwrap_list, ApiClient};
use crate::models::{Approval, ApprovalDecision};

#[derive(Serialize)]
struct DecisionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

/// Human-in-the-loop checkpoints raised by process agents.
pub struct ApprovalsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ApprovalsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn pending(&self) -> AgentloomResult<Vec<Approval>> {
        let value: Value = self.client.get("/api/process/approvals").await?;
        unwrap_list(value, "approvals")
    }

    pub async fn decide(
        &self,
        id: &str,
        decision: ApprovalDecision,
        comment: Option<&str>,
    ) -> AgentloomResult<()> {
        let _: Value = self
            .client
            .post(
                &format!("/api/process/approvals/{}/{}", id, decision.path_segment()),
                &DecisionBody { comment },
            )
            .await?;
        info!(approval_id = %id, decision = ?decision, "Recorded approval decision");
        Ok(())
    }
}
