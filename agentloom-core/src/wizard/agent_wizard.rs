use serde::Serialize;
use tracing::{info, warn};

use super::steps::AgentStep;
use super::{require_text, validate_access, WizardFlow};
use crate::error::{AgentloomError, AgentloomResult};
use crate::http::ApiClient;
use crate::models::{AccessControl, Agent, AgentTask, AgentType, Guardrails, Personality};

const LEVEL_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Outcome of a submit: the agent is saved even when publishing fails.
#[derive(Debug)]
pub struct AgentSubmitReport {
    pub agent_id: String,
    pub created: bool,
    pub published: bool,
    pub publish_error: Option<AgentloomError>,
}

impl AgentSubmitReport {
    pub fn is_clean(&self) -> bool {
        self.publish_error.is_none()
    }
}

#[derive(Serialize)]
struct AgentPayload<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(rename = "type")]
    agent_type: AgentType,
    goal: &'a str,
    tasks: &'a [AgentTask],
    tool_ids: &'a [String],
    personality: &'a Personality,
    guardrails: &'a Guardrails,
    access_control: &'a AccessControl,
}

#[derive(Debug, Clone, Default)]
pub struct AgentWizard {
    position: usize,
    editing_id: Option<String>,
    pub name: String,
    pub description: String,
    pub agent_type: AgentType,
    pub goal: String,
    pub tasks: Vec<AgentTask>,
    pub tool_ids: Vec<String>,
    pub personality: Personality,
    pub guardrails: Guardrails,
    pub access: AccessControl,
}

impl AgentWizard {
    pub fn new(agent_type: AgentType) -> Self {
        Self {
            agent_type,
            ..Default::default()
        }
    }

    pub fn edit(agent: &Agent) -> Self {
        Self {
            position: 0,
            editing_id: Some(agent.id.clone()),
            name: agent.name.clone(),
            description: agent.description.clone(),
            agent_type: agent.agent_type,
            goal: agent.goal.clone(),
            tasks: agent.tasks.clone(),
            tool_ids: agent.tool_ids.clone(),
            personality: agent.personality.clone(),
            guardrails: agent.guardrails.clone(),
            access: agent.access_control.clone(),
        }
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    /// Attach a tool once, keeping selection order.
    pub fn toggle_tool(&mut self, tool_id: &str) -> bool {
        if let Some(idx) = self.tool_ids.iter().position(|t| t == tool_id) {
            self.tool_ids.remove(idx);
            false
        } else {
            self.tool_ids.push(tool_id.to_string());
            true
        }
    }

    pub fn build_payload(&self) -> serde_json::Value {
        let payload = AgentPayload {
            name: self.name.trim(),
            description: self.description.trim(),
            agent_type: self.agent_type,
            goal: self.goal.trim(),
            tasks: &self.tasks,
            tool_ids: &self.tool_ids,
            personality: &self.personality,
            guardrails: &self.guardrails,
            access_control: &self.access,
        };
        serde_json::to_value(payload).unwrap_or_default()
    }

    /// Create or update the agent, optionally publishing it afterwards.
    ///
    /// A failed publish leaves the saved draft in place.
    pub async fn submit(
        &self,
        client: &ApiClient,
        publish: bool,
    ) -> AgentloomResult<AgentSubmitReport> {
        self.validate_all()?;
        let payload = self.build_payload();
        let agents = client.agents();

        let (agent_id, created) = match &self.editing_id {
            Some(id) => {
                agents.update(id, &payload).await?;
                (id.clone(), false)
            }
            None => (agents.create(&payload).await?, true),
        };

        let mut publish_error = None;
        if publish {
            if let Err(e) = agents.publish(&agent_id).await {
                warn!(agent_id = %agent_id, error = %e, "Publish failed; agent kept as draft");
                publish_error = Some(AgentloomError::FollowUpFailed {
                    step: "publish".into(),
                    message: e.to_string(),
                });
            }
        }
        let published = publish && publish_error.is_none();

        info!(agent_id = %agent_id, created, published, "Agent saved");
        Ok(AgentSubmitReport {
            agent_id,
            created,
            published,
            publish_error,
        })
    }

    fn validate_tasks(&self) -> AgentloomResult<()> {
        if self.agent_type == AgentType::Process && self.tasks.is_empty() {
            return Err(AgentloomError::validation(
                "tasks",
                "Process agents need at least one task",
            ));
        }
        if let Some(idx) = self.tasks.iter().position(|t| t.name.trim().is_empty()) {
            return Err(AgentloomError::validation(
                "tasks",
                format!("Task {} has no name", idx + 1),
            ));
        }
        Ok(())
    }

    fn validate_personality(&self) -> AgentloomResult<()> {
        require_text("tone", &self.personality.tone, "Tone")?;
        for (field, value) in [
            ("creativity", self.personality.creativity),
            ("length", self.personality.length),
        ] {
            if !LEVEL_RANGE.contains(&value) {
                return Err(AgentloomError::validation(
                    field,
                    format!("{} must be between 1 and 10", field),
                ));
            }
        }
        Ok(())
    }

    fn validate_guardrails(&self) -> AgentloomResult<()> {
        if self.guardrails.max_response_length == Some(0) {
            return Err(AgentloomError::validation(
                "max_response_length",
                "Maximum response length must be positive",
            ));
        }
        if self
            .guardrails
            .blocked_topics
            .iter()
            .any(|t| t.trim().is_empty())
        {
            return Err(AgentloomError::validation(
                "blocked_topics",
                "Blocked topics cannot be blank",
            ));
        }
        Ok(())
    }
}

impl WizardFlow for AgentWizard {
    type Step = AgentStep;

    fn step_count(&self) -> usize {
        AgentStep::ALL.len()
    }

    fn step_at(&self, position: usize) -> Option<AgentStep> {
        AgentStep::ALL.get(position).copied()
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) {
        self.position = position.min(AgentStep::ALL.len() - 1);
    }

    fn validate_step(&self, step: AgentStep) -> AgentloomResult<()> {
        match step {
            AgentStep::Basics => {
                require_text("name", &self.name, "Agent name")?;
                if self.agent_type == AgentType::Process {
                    require_text("goal", &self.goal, "Goal")?;
                }
                Ok(())
            }
            AgentStep::Tasks => self.validate_tasks(),
            AgentStep::Tools => Ok(()),
            AgentStep::Personality => self.validate_personality(),
            AgentStep::Guardrails => self.validate_guardrails(),
            AgentStep::Access => validate_access(&self.access),
            AgentStep::Review => Ok(()),
        }
    }
}
