pub mod agents;
pub mod approvals;
pub mod auth;
pub mod chat;
pub mod config;
pub mod conversations;
pub mod knowledge;
pub mod open;
pub mod security;
pub mod tools;

pub use agents::{handle_agents_command, AgentsCommand};
pub use approvals::{handle_approvals_command, ApprovalsCommand};
pub use auth::{handle_auth_command, AuthCommand};
pub use chat::{handle_chat_command, ChatArgs};
pub use config::{handle_config_command, ConfigCommand};
pub use conversations::{handle_conversations_command, ConversationsCommand};
pub use knowledge::{handle_knowledge_command, KnowledgeCommand};
pub use open::{handle_open_command, OpenArgs};
pub use security::{handle_security_command, SecurityCommand};
pub use tools::{handle_tools_command, ToolsCommand};

use agentloom_core::{AccessControl, AccessType, WizardFlow};
use anyhow::anyhow;
use clap::Args;
use colored::Colorize;

/// Who may use an agent or tool.
#[derive(Args, Debug, Clone, Default)]
pub struct AccessArgs {
    #[arg(
        long,
        help = "Access type: owner_only, authenticated, specific_users, public"
    )]
    pub access: Option<String>,

    #[arg(long = "user", help = "User id allowed access (repeatable)")]
    pub users: Vec<String>,

    #[arg(long = "group", help = "Group id allowed access (repeatable)")]
    pub groups: Vec<String>,
}

impl AccessArgs {
    pub fn apply(&self, access: &mut AccessControl) -> anyhow::Result<()> {
        if let Some(raw) = &self.access {
            access.access_type = raw.parse::<AccessType>().map_err(|e| anyhow!(e))?;
        }
        if !self.users.is_empty() {
            access.allowed_user_ids = self.users.clone();
        }
        if !self.groups.is_empty() {
            access.allowed_group_ids = self.groups.clone();
        }
        Ok(())
    }
}

/// Walk a wizard to its review step, validating each step on the way.
pub fn complete_wizard<W: WizardFlow>(wizard: &mut W, quiet: bool) -> anyhow::Result<()> {
    while !wizard.is_last_step() {
        let from = wizard.current_step();
        wizard.next()?;
        if let (Some(step), false) = (from, quiet) {
            println!("  {} {}", "✓".green(), step.to_string().dimmed());
        }
    }
    Ok(())
}

pub fn confirm_flag(yes: bool, what: &str) -> anyhow::Result<()> {
    if yes {
        Ok(())
    } else {
        Err(anyhow!("Refusing to delete {} without --yes", what))
    }
}
