use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tool::AccessType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    #[default]
    Conversational,
    Process,
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentType::Conversational => write!(f, "conversational"),
            AgentType::Process => write!(f, "process"),
        }
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conversational" | "chat" => Ok(AgentType::Conversational),
            "process" | "workflow" => Ok(AgentType::Process),
            other => Err(format!("Unknown agent type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Draft,
    Published,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Draft => write!(f, "draft"),
            AgentStatus::Published => write!(f, "published"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_level")]
    pub creativity: u8,
    #[serde(default = "default_level")]
    pub length: u8,
    #[serde(default)]
    pub language: Option<String>,
}

fn default_tone() -> String {
    "professional".to_string()
}

fn default_level() -> u8 {
    5
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            tone: default_tone(),
            creativity: default_level(),
            length: default_level(),
            language: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Guardrails {
    #[serde(default)]
    pub anti_hallucination: bool,
    #[serde(default)]
    pub cite_sources: bool,
    #[serde(default)]
    pub blocked_topics: Vec<String>,
    #[serde(default)]
    pub pii_protection: bool,
    #[serde(default)]
    pub max_response_length: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AccessControl {
    #[serde(default)]
    pub access_type: AccessType,
    #[serde(default)]
    pub allowed_user_ids: Vec<String>,
    #[serde(default)]
    pub allowed_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", alias = "agent_type", default)]
    pub agent_type: AgentType,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub tasks: Vec<AgentTask>,
    #[serde(default)]
    pub tool_ids: Vec<String>,
    #[serde(default)]
    pub guardrails: Guardrails,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub access_control: AccessControl,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Agent {
    pub fn is_published(&self) -> bool {
        self.status == AgentStatus::Published
    }
}
