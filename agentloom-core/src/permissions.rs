//! Presentation-level permission gating.
//!
//! The server decides what the user may do and hands the client a permission
//! list. This module only decides which actions to show, grey out or hide;
//! every request is authorized again server-side.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{AgentloomError, AgentloomResult};
use crate::models::{CurrentUser, Tool};

const WILDCARD: &str = "*";
const ADMIN_ROLES: [&str; 2] = ["admin", "super_admin"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: HashSet<String>,
    admin: bool,
}

impl PermissionSet {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            admin: false,
        }
    }

    pub fn for_user(user: &CurrentUser) -> Self {
        let mut set = Self::new(user.permissions.iter().cloned());
        set.admin = user
            .roles
            .iter()
            .any(|r| ADMIN_ROLES.contains(&r.to_lowercase().as_str()));
        set
    }

    pub fn is_admin(&self) -> bool {
        self.admin || self.permissions.contains(WILDCARD)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// `resource:action` matches itself, `resource:*` and `*`.
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_admin() || self.permissions.contains(permission) {
            return true;
        }
        let mut prefix = permission;
        while let Some(idx) = prefix.rfind(':') {
            prefix = &prefix[..idx];
            if self.permissions.contains(&format!("{}:*", prefix)) {
                return true;
            }
        }
        false
    }

    pub fn has_any(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.has_permission(p))
    }

    /// Pre-flight check before issuing a request the user likely cannot make.
    pub fn require(&self, permission: &str) -> AgentloomResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AgentloomError::PermissionDenied(format!(
                "missing '{}'",
                permission
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    Hide,
    Disable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
    Enabled,
    Disabled { reason: String },
    Hidden,
}

impl UiState {
    pub fn is_usable(&self) -> bool {
        matches!(self, UiState::Enabled)
    }
}

/// A user-facing action guarded by one of several permissions.
#[derive(Debug, Clone)]
pub struct Affordance {
    pub id: &'static str,
    pub label: &'static str,
    pub any_of: &'static [&'static str],
    pub restriction: Restriction,
}

pub const AFFORDANCES: &[Affordance] = &[
    Affordance {
        id: "agents.create",
        label: "Create agent",
        any_of: &["agents:create"],
        restriction: Restriction::Hide,
    },
    Affordance {
        id: "agents.edit",
        label: "Edit agent",
        any_of: &["agents:update"],
        restriction: Restriction::Disable,
    },
    Affordance {
        id: "agents.delete",
        label: "Delete agent",
        any_of: &["agents:delete"],
        restriction: Restriction::Disable,
    },
    Affordance {
        id: "agents.publish",
        label: "Publish agent",
        any_of: &["agents:publish", "agents:update"],
        restriction: Restriction::Disable,
    },
    Affordance {
        id: "tools.create",
        label: "Create tool",
        any_of: &["tools:create"],
        restriction: Restriction::Hide,
    },
    Affordance {
        id: "tools.delete",
        label: "Delete tool",
        any_of: &["tools:delete"],
        restriction: Restriction::Disable,
    },
    Affordance {
        id: "knowledge.upload",
        label: "Upload documents",
        any_of: &["tools:update", "knowledge:write"],
        restriction: Restriction::Disable,
    },
    Affordance {
        id: "approvals.decide",
        label: "Approve or reject",
        any_of: &["process:approve"],
        restriction: Restriction::Hide,
    },
    Affordance {
        id: "security.users",
        label: "Manage users",
        any_of: &["security:users:manage"],
        restriction: Restriction::Hide,
    },
    Affordance {
        id: "security.roles",
        label: "Manage roles and groups",
        any_of: &["security:roles:manage"],
        restriction: Restriction::Hide,
    },
    Affordance {
        id: "security.audit",
        label: "View audit log",
        any_of: &["security:audit:read"],
        restriction: Restriction::Hide,
    },
];

pub fn affordance(id: &str) -> Option<&'static Affordance> {
    AFFORDANCES.iter().find(|a| a.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    Edit,
    Delete,
    Execute,
}

#[derive(Debug, Clone)]
pub struct PermissionGate {
    permissions: PermissionSet,
    user_id: Option<String>,
}

impl PermissionGate {
    pub fn new(permissions: PermissionSet) -> Self {
        Self {
            permissions,
            user_id: None,
        }
    }

    pub fn for_user(user: &CurrentUser) -> Self {
        Self {
            permissions: PermissionSet::for_user(user),
            user_id: Some(user.id.clone()),
        }
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn state_of(&self, affordance: &Affordance) -> UiState {
        if self.permissions.has_any(affordance.any_of) {
            return UiState::Enabled;
        }
        match affordance.restriction {
            Restriction::Hide => UiState::Hidden,
            Restriction::Disable => UiState::Disabled {
                reason: format!("Requires {}", affordance.any_of.join(" or ")),
            },
        }
    }

    /// Resolve every affordance to the state it should be rendered in.
    pub fn apply_restrictions<'a>(
        &self,
        affordances: &'a [Affordance],
    ) -> Vec<(&'a Affordance, UiState)> {
        affordances.iter().map(|a| (a, self.state_of(a))).collect()
    }

    /// Affordances that should be rendered at all (enabled or greyed out).
    pub fn visible_actions<'a>(&self, affordances: &'a [Affordance]) -> Vec<&'a Affordance> {
        affordances
            .iter()
            .filter(|a| self.state_of(a) != UiState::Hidden)
            .collect()
    }

    /// Per-tool check layering the tool's own user lists over global permissions.
    pub fn tool_action_state(&self, tool: &Tool, action: ToolAction) -> UiState {
        let global = match action {
            ToolAction::Edit => "tools:update",
            ToolAction::Delete => "tools:delete",
            ToolAction::Execute => "tools:execute",
        };
        if self.permissions.has_permission(global) {
            return UiState::Enabled;
        }

        let Some(user_id) = self.user_id.as_deref() else {
            return UiState::Hidden;
        };
        if tool.owner_id.as_deref() == Some(user_id) {
            return UiState::Enabled;
        }

        let listed = match action {
            ToolAction::Edit => &tool.permissions.can_edit_user_ids,
            ToolAction::Delete => &tool.permissions.can_delete_user_ids,
            ToolAction::Execute => &tool.permissions.can_execute_user_ids,
        };
        if listed.iter().any(|id| id == user_id) {
            UiState::Enabled
        } else {
            UiState::Disabled {
                reason: "You do not have access to this tool".to_string(),
            }
        }
    }
}
