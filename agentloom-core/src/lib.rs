#![allow(
    clippy::needless_borrows_for_generic_args,
    clippy::manual_range_contains,
    clippy::derivable_impls,
    clippy::type_complexity,
    clippy::len_zero,
    dead_code,
    unused_imports
)]

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod pages;
pub mod permissions;
pub mod stream;
pub mod token;
pub mod wizard;

pub use api::{
    AgentsApi, ApprovalsApi, AuthApi, ConversationsApi, KnowledgeApi, LoginOutcome, SecurityApi,
    ToolsApi,
};
pub use config::{
    default_config_file, get_config_dir, AgentloomConfig, ApiConfig, AuthConfig, DisplayConfig,
    LoggingConfig,
};
pub use error::{AgentloomError, AgentloomResult, CliErrorDisplay};
pub use http::{created_id, unwrap_list, unwrap_object, ApiClient};
pub use models::{
    AccessControl, AccessType, Agent, AgentStatus, AgentTask, AgentType, Approval,
    ApprovalDecision, AuditEntry, AuditQuery, ChatRequest, Conversation, ConversationSummary,
    CurrentUser, Document, Group, Guardrails, LoginResponse, Message, MfaSetup, OrgNode,
    Personality, Role, RoleDef, ScrapeRequest, Source, TableEntry, TextEntry, Tool,
    ToolPermissions, ToolType, User, UserDraft,
};
pub use pages::{navigate, DashboardSummary, Page, PageData, PageSnapshot};
pub use permissions::{
    affordance, Affordance, PermissionGate, PermissionSet, Restriction, ToolAction, UiState,
    AFFORDANCES,
};
pub use stream::{
    ByteStream, ChatMode, ChatRenderer, ChatSession, ChatStreamSource, ChatTurn, SseDecoder,
    StreamEvent, TurnOutcome, TurnState, CONNECTION_ERROR_MESSAGE, NO_RESPONSE_MESSAGE,
    STREAM_CLOSED_MESSAGE,
};
pub use token::{TokenPersistence, TokenStore};
pub use wizard::{
    required_config_fields, AgentStep, AgentSubmitReport, AgentWizard, PendingSources,
    SubmitReport, ToolCapabilities, ToolStep, ToolWizard, WizardFlow,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
