//! Endpoint groups of the builder API, reached through [`ApiClient`].

mod agents;
mod approvals;
mod auth;
mod conversations;
mod knowledge;
mod security;
mod tools;

pub use agents::AgentsApi;
pub use approvals::ApprovalsApi;
pub use auth::{AuthApi, LoginOutcome};
pub use conversations::ConversationsApi;
pub use knowledge::KnowledgeApi;
pub use security::SecurityApi;
pub use tools::ToolsApi;

use crate::http::ApiClient;

impl ApiClient {
    pub fn agents(&self) -> AgentsApi<'_> {
        AgentsApi::new(self)
    }

    pub fn tools(&self) -> ToolsApi<'_> {
        ToolsApi::new(self)
    }

    pub fn knowledge(&self) -> KnowledgeApi<'_> {
        KnowledgeApi::new(self)
    }

    pub fn conversations(&self) -> ConversationsApi<'_> {
        ConversationsApi::new(self)
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn security(&self) -> SecurityApi<'_> {
        SecurityApi::new(self)
    }

    pub fn approvals(&self) -> ApprovalsApi<'_> {
        ApprovalsApi::new(self)
    }
}
