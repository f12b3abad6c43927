use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tool kinds the wizard knows how to build. Types added server-side later
/// decode as [`ToolType::Other`] so one unfamiliar tool never breaks a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToolType {
    Api,
    Website,
    Database,
    Knowledge,
    Email,
    Webhook,
    Slack,
    Spreadsheet,
    Other(String),
}

impl ToolType {
    pub const ALL: [ToolType; 8] = [
        ToolType::Api,
        ToolType::Website,
        ToolType::Database,
        ToolType::Knowledge,
        ToolType::Email,
        ToolType::Webhook,
        ToolType::Slack,
        ToolType::Spreadsheet,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ToolType::Api => "api",
            ToolType::Website => "website",
            ToolType::Database => "database",
            ToolType::Knowledge => "knowledge",
            ToolType::Email => "email",
            ToolType::Webhook => "webhook",
            ToolType::Slack => "slack",
            ToolType::Spreadsheet => "spreadsheet",
            ToolType::Other(name) => name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ToolType::Api => "REST API",
            ToolType::Website => "Website",
            ToolType::Database => "Database",
            ToolType::Knowledge => "Knowledge Base",
            ToolType::Email => "Email",
            ToolType::Webhook => "Webhook",
            ToolType::Slack => "Slack",
            ToolType::Spreadsheet => "Spreadsheet",
            ToolType::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ToolType::Other(_))
    }
}

impl std::fmt::Display for ToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse for user input: only the types the wizard can build.
impl std::str::FromStr for ToolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ToolType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("Unknown tool type: {}", s))
    }
}

impl From<String> for ToolType {
    fn from(raw: String) -> Self {
        raw.parse().unwrap_or(ToolType::Other(raw))
    }
}

impl From<ToolType> for String {
    fn from(tool_type: ToolType) -> Self {
        match tool_type {
            ToolType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    #[default]
    OwnerOnly,
    Authenticated,
    SpecificUsers,
    Public,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::OwnerOnly => "owner_only",
            AccessType::Authenticated => "authenticated",
            AccessType::SpecificUsers => "specific_users",
            AccessType::Public => "public",
        }
    }
}

impl std::fmt::Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "owner_only" | "owner" | "private" => Ok(AccessType::OwnerOnly),
            "authenticated" => Ok(AccessType::Authenticated),
            "specific_users" | "specific" => Ok(AccessType::SpecificUsers),
            "public" => Ok(AccessType::Public),
            other => Err(format!("Unknown access type: {}", other)),
        }
    }
}

/// Per-action user lists layered on top of the access type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ToolPermissions {
    #[serde(default)]
    pub can_edit_user_ids: Vec<String>,
    #[serde(default)]
    pub can_delete_user_ids: Vec<String>,
    #[serde(default)]
    pub can_execute_user_ids: Vec<String>,
}

impl ToolPermissions {
    pub fn is_empty(&self) -> bool {
        self.can_edit_user_ids.is_empty()
            && self.can_delete_user_ids.is_empty()
            && self.can_execute_user_ids.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub access_type: AccessType,
    #[serde(default)]
    pub allowed_user_ids: Vec<String>,
    #[serde(default)]
    pub allowed_group_ids: Vec<String>,
    #[serde(flatten)]
    pub permissions: ToolPermissions,
    #[serde(default)]
    pub document_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
