mod agent;
mod conversation;
mod knowledge;
mod security;
mod tool;

pub use agent::{
    AccessControl, Agent, AgentStatus, AgentTask, AgentType, Guardrails, Personality,
};
pub use conversation::{ChatRequest, Conversation, ConversationSummary, Message, Role, Source};
pub use knowledge::{Document, ScrapeRequest, TableEntry, TextEntry};
pub use security::{
    Approval, ApprovalDecision, AuditEntry, AuditQuery, CurrentUser, Group, LoginResponse,
    MfaSetup, OrgNode, RoleDef, User, UserDraft,
};
pub use tool::{AccessType, Tool, ToolPermissions, ToolType};
