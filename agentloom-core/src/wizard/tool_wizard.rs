use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing::{info, warn};

use super::steps::{ToolCapabilities, ToolStep};
use super::{is_http_url, require_text, validate_access, WizardFlow};
use crate::error::{AgentloomError, AgentloomResult};
use crate::http::ApiClient;
use crate::models::{AccessControl, ScrapeRequest, TableEntry, TextEntry, Tool, ToolPermissions, ToolType};

/// Config keys a tool type cannot be saved without.
pub fn required_config_fields(tool_type: &ToolType) -> &'static [&'static str] {
    match tool_type {
        ToolType::Api => &["base_url"],
        ToolType::Website => &["url"],
        ToolType::Database => &["connection_string"],
        ToolType::Email => &["smtp_host", "from_address"],
        ToolType::Webhook => &["url"],
        ToolType::Slack => &["bot_token", "channel"],
        ToolType::Knowledge | ToolType::Spreadsheet | ToolType::Other(_) => &[],
    }
}

const URL_FIELDS: [&str; 2] = ["base_url", "url"];

/// Knowledge queued in the Sources step, sent after the tool exists.
#[derive(Debug, Clone, Default)]
pub struct PendingSources {
    pub files: Vec<PathBuf>,
    pub urls: Vec<ScrapeRequest>,
    pub texts: Vec<TextEntry>,
    pub tables: Vec<TableEntry>,
}

impl PendingSources {
    pub fn len(&self) -> usize {
        self.files.len() + self.urls.len() + self.texts.len() + self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self) -> AgentloomResult<()> {
        if let Some(missing) = self.files.iter().find(|f| !f.is_file()) {
            return Err(AgentloomError::validation(
                "files",
                format!("File not found: {}", missing.display()),
            ));
        }
        if let Some(bad) = self.urls.iter().find(|u| !is_http_url(&u.url)) {
            return Err(AgentloomError::validation(
                "urls",
                format!("Not an http(s) URL: {}", bad.url),
            ));
        }
        if self.texts.iter().any(|t| t.content.trim().is_empty()) {
            return Err(AgentloomError::validation(
                "texts",
                "Text entries need content",
            ));
        }
        for table in &self.tables {
            if table.columns.is_empty() || !table.is_rectangular() {
                return Err(AgentloomError::validation(
                    "tables",
                    format!("Table '{}' has mismatched columns", table.name),
                ));
            }
        }
        Ok(())
    }
}

/// Outcome of a submit: the tool is saved even when follow-ups fail.
#[derive(Debug)]
pub struct SubmitReport {
    pub tool_id: String,
    pub created: bool,
    pub completed: usize,
    pub failures: Vec<AgentloomError>,
}

impl SubmitReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ToolWizard {
    position: usize,
    tool_type: ToolType,
    editing_id: Option<String>,
    pub name: String,
    pub description: String,
    pub config: Map<String, Value>,
    pub sources: PendingSources,
    pub access: AccessControl,
    pub permissions: ToolPermissions,
}

impl ToolWizard {
    pub fn new(tool_type: ToolType) -> Self {
        Self {
            position: 0,
            tool_type,
            editing_id: None,
            name: String::new(),
            description: String::new(),
            config: Map::new(),
            sources: PendingSources::default(),
            access: AccessControl::default(),
            permissions: ToolPermissions::default(),
        }
    }

    /// Start from an existing tool; submit will PUT instead of POST.
    pub fn edit(tool: &Tool) -> Self {
        let config = match &tool.config {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        Self {
            position: 0,
            tool_type: tool.tool_type.clone(),
            editing_id: Some(tool.id.clone()),
            name: tool.name.clone(),
            description: tool.description.clone(),
            config,
            sources: PendingSources::default(),
            access: AccessControl {
                access_type: tool.access_type,
                allowed_user_ids: tool.allowed_user_ids.clone(),
                allowed_group_ids: tool.allowed_group_ids.clone(),
            },
            permissions: tool.permissions.clone(),
        }
    }

    pub fn tool_type(&self) -> &ToolType {
        &self.tool_type
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::of(&self.tool_type)
    }

    /// Switching type is only allowed from Basics and drops the old config.
    pub fn set_tool_type(&mut self, tool_type: ToolType) -> AgentloomResult<()> {
        if tool_type == self.tool_type {
            return Ok(());
        }
        if self.position != 0 || self.editing_id.is_some() {
            return Err(AgentloomError::InvalidTransition(
                "the tool type can only be chosen on the first step of a new tool".into(),
            ));
        }
        self.tool_type = tool_type;
        self.config.clear();
        if !self.capabilities().has_sources {
            self.sources = PendingSources::default();
        }
        Ok(())
    }

    pub fn set_config(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.config.insert(key.into(), value.into());
    }

    pub fn build_payload(&self) -> Value {
        let mut payload = json!({
            "name": self.name.trim(),
            "description": self.description.trim(),
            "type": self.tool_type,
            "config": self.config,
            "access_type": self.access.access_type,
            "allowed_user_ids": self.access.allowed_user_ids,
            "allowed_group_ids": self.access.allowed_group_ids,
        });
        if !self.permissions.is_empty() {
            if let (Value::Object(target), Ok(Value::Object(extra))) =
                (&mut payload, serde_json::to_value(&self.permissions))
            {
                target.extend(extra);
            }
        }
        payload
    }

    /// Save the tool, then run queued follow-ups one at a time.
    ///
    /// A failed follow-up is recorded in the report; the saved tool is left
    /// in place and the remaining follow-ups still run.
    pub async fn submit(&self, client: &ApiClient) -> AgentloomResult<SubmitReport> {
        self.validate_all()?;
        let payload = self.build_payload();
        let tools = client.tools();

        let (tool_id, created) = match &self.editing_id {
            Some(id) => {
                tools.update(id, &payload).await?;
                (id.clone(), false)
            }
            None => (tools.create(&payload, client.create_timeout()).await?, true),
        };

        let mut report = SubmitReport {
            tool_id,
            created,
            completed: 0,
            failures: Vec::new(),
        };
        let id = report.tool_id.clone();

        for file in &self.sources.files {
            let result = tools.upload_document(&id, file).await;
            record(&mut report, "upload", &file.display().to_string(), result);
        }
        for request in &self.sources.urls {
            let result = tools.scrape(&id, request).await;
            record(&mut report, "scrape", &request.url, result);
        }
        for entry in &self.sources.texts {
            let result = tools.add_text_entry(&id, entry).await;
            record(&mut report, "text entry", &entry.title, result);
        }
        for table in &self.sources.tables {
            let result = tools.add_table(&id, table).await;
            record(&mut report, "table", &table.name, result);
        }

        info!(
            tool_id = %id,
            created,
            completed = report.completed,
            failed = report.failures.len(),
            "Tool saved"
        );
        Ok(report)
    }

    fn validate_config(&self) -> AgentloomResult<()> {
        for field in required_config_fields(&self.tool_type) {
            let present = self
                .config
                .get(*field)
                .map(|v| match v {
                    Value::String(s) => !s.trim().is_empty(),
                    Value::Null => false,
                    _ => true,
                })
                .unwrap_or(false);
            if !present {
                return Err(AgentloomError::validation(
                    *field,
                    format!("{} is required for {} tools", field, self.tool_type.label()),
                ));
            }
        }
        for field in URL_FIELDS {
            if let Some(Value::String(url)) = self.config.get(field) {
                if !is_http_url(url) {
                    return Err(AgentloomError::validation(
                        field,
                        "Must start with http:// or https://",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn record(
    report: &mut SubmitReport,
    step: &str,
    target: &str,
    result: AgentloomResult<Value>,
) {
    match result {
        Ok(_) => report.completed += 1,
        Err(e) => {
            warn!(tool_id = %report.tool_id, step, target, "Follow-up failed: {}", e);
            report.failures.push(AgentloomError::FollowUpFailed {
                step: format!("{} {}", step, target),
                message: e.to_string(),
            });
        }
    }
}

impl WizardFlow for ToolWizard {
    type Step = ToolStep;

    fn step_count(&self) -> usize {
        self.capabilities().step_count()
    }

    fn step_at(&self, position: usize) -> Option<ToolStep> {
        self.capabilities().actual_step(position)
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) {
        self.position = position.min(self.step_count().saturating_sub(1));
    }

    fn validate_step(&self, step: ToolStep) -> AgentloomResult<()> {
        match step {
            ToolStep::Basics => require_text("name", &self.name, "Tool name"),
            ToolStep::Config => self.validate_config(),
            ToolStep::Sources => self.sources.validate(),
            ToolStep::Access => validate_access(&self.access),
            ToolStep::Review => Ok(()),
        }
    }
}
