//! Multi-step create/edit flows for tools and agents.
//!
//! Each wizard is a plain state struct. [`WizardFlow`] supplies the shared
//! stepping rules: `next` validates the visible step before advancing, `back`
//! never validates, and neither moves past the ends.

mod agent_wizard;
mod steps;
mod tool_wizard;

pub use agent_wizard::{AgentSubmitReport, AgentWizard};
pub use steps::{AgentStep, ToolCapabilities, ToolStep};
pub use tool_wizard::{required_config_fields, PendingSources, SubmitReport, ToolWizard};

use std::fmt;
use tracing::debug;

use crate::error::{AgentloomError, AgentloomResult};
use crate::models::{AccessControl, AccessType};

pub trait WizardFlow {
    type Step: Copy + PartialEq + fmt::Display;

    fn step_count(&self) -> usize;

    fn step_at(&self, position: usize) -> Option<Self::Step>;

    fn position(&self) -> usize;

    fn set_position(&mut self, position: usize);

    fn validate_step(&self, step: Self::Step) -> AgentloomResult<()>;

    fn current_step(&self) -> Option<Self::Step> {
        self.step_at(self.position())
    }

    fn is_last_step(&self) -> bool {
        self.position() + 1 >= self.step_count()
    }

    fn next(&mut self) -> AgentloomResult<Self::Step> {
        let current = self
            .current_step()
            .ok_or_else(|| AgentloomError::InvalidTransition("wizard is out of range".into()))?;
        if self.is_last_step() {
            return Err(AgentloomError::InvalidTransition(format!(
                "'{}' is the last step",
                current
            )));
        }
        self.validate_step(current)?;
        self.set_position(self.position() + 1);
        let step = self
            .current_step()
            .ok_or_else(|| AgentloomError::Internal("step table is shorter than its count".into()))?;
        debug!(from = %current, to = %step, "Wizard advanced");
        Ok(step)
    }

    fn back(&mut self) -> AgentloomResult<Self::Step> {
        if self.position() == 0 {
            return Err(AgentloomError::InvalidTransition(
                "already at the first step".into(),
            ));
        }
        self.set_position(self.position() - 1);
        self.current_step()
            .ok_or_else(|| AgentloomError::Internal("step table is shorter than its count".into()))
    }

    /// Validate every step; used before submitting.
    fn validate_all(&self) -> AgentloomResult<()> {
        for position in 0..self.step_count() {
            if let Some(step) = self.step_at(position) {
                self.validate_step(step)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_access(access: &AccessControl) -> AgentloomResult<()> {
    if access.access_type == AccessType::SpecificUsers
        && access.allowed_user_ids.is_empty()
        && access.allowed_group_ids.is_empty()
    {
        return Err(AgentloomError::validation(
            "access",
            "Select at least one user or group",
        ));
    }
    Ok(())
}

pub(crate) fn require_text(field: &str, value: &str, label: &str) -> AgentloomResult<()> {
    if value.trim().is_empty() {
        Err(AgentloomError::validation(field, format!("{} is required", label)))
    } else {
        Ok(())
    }
}

pub(crate) fn is_http_url(value: &str) -> bool {
    let v = value.trim();
    v.strip_prefix("https://")
        .or_else(|| v.strip_prefix("http://"))
        .is_some_and(|host| !host.is_empty())
}
