use agentloom_core::{Agent, AgentStatus, AgentTask, AgentType, AgentWizard};
use anyhow::anyhow;
use clap::{Args, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, Color};

use super::{complete_wizard, confirm_flag, AccessArgs};
use crate::context::{CliContext, GlobalOptions};
use crate::output::{format_time, new_table, print_empty, print_json, print_success, truncate, OutputFormat};

#[derive(Subcommand)]
pub enum AgentsCommand {
    #[command(about = "List agents")]
    List {
        #[arg(long, help = "Only published agents")]
        published: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Show one agent in detail")]
    Show {
        id: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Create an agent")]
    Create {
        #[arg(
            short = 't',
            long = "type",
            default_value = "conversational",
            help = "conversational or process"
        )]
        agent_type: String,

        #[command(flatten)]
        fields: AgentFields,

        #[arg(long, help = "Publish right after creating")]
        publish: bool,
    },

    #[command(about = "Edit an existing agent; only the given fields change")]
    Edit {
        id: String,

        #[command(flatten)]
        fields: AgentFields,

        #[arg(long, help = "Publish after saving")]
        publish: bool,
    },

    #[command(about = "Publish a draft agent")]
    Publish { id: String },

    #[command(about = "Delete an agent")]
    Delete {
        id: String,

        #[arg(short, long, help = "Confirm deletion")]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AgentFields {
    #[arg(short, long)]
    name: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    #[arg(short, long, help = "What the agent is for (required for process agents)")]
    goal: Option<String>,

    #[arg(long = "task", help = "Task as 'name: instructions' (repeatable)")]
    tasks: Vec<String>,

    #[arg(long = "tool", help = "Tool id to attach (repeatable)")]
    tools: Vec<String>,

    #[arg(long)]
    tone: Option<String>,

    #[arg(long, help = "1-10")]
    creativity: Option<u8>,

    #[arg(long, help = "Response length, 1-10")]
    length: Option<u8>,

    #[arg(long)]
    language: Option<String>,

    #[arg(long)]
    cite_sources: bool,

    #[arg(long)]
    anti_hallucination: bool,

    #[arg(long)]
    pii_protection: bool,

    #[arg(long = "blocked-topic", help = "Topic the agent must refuse (repeatable)")]
    blocked_topics: Vec<String>,

    #[arg(long)]
    max_response_length: Option<u32>,

    #[command(flatten)]
    access: AccessArgs,
}

impl AgentFields {
    fn apply(&self, wizard: &mut AgentWizard) -> anyhow::Result<()> {
        if let Some(name) = &self.name {
            wizard.name = name.clone();
        }
        if let Some(description) = &self.description {
            wizard.description = description.clone();
        }
        if let Some(goal) = &self.goal {
            wizard.goal = goal.clone();
        }
        if !self.tasks.is_empty() {
            wizard.tasks = self.tasks.iter().map(|t| parse_task(t)).collect();
        }
        if !self.tools.is_empty() {
            wizard.tool_ids.clear();
            for tool in &self.tools {
                wizard.toggle_tool(tool);
            }
        }
        if let Some(tone) = &self.tone {
            wizard.personality.tone = tone.clone();
        }
        if let Some(creativity) = self.creativity {
            wizard.personality.creativity = creativity;
        }
        if let Some(length) = self.length {
            wizard.personality.length = length;
        }
        if self.language.is_some() {
            wizard.personality.language = self.language.clone();
        }
        wizard.guardrails.cite_sources |= self.cite_sources;
        wizard.guardrails.anti_hallucination |= self.anti_hallucination;
        wizard.guardrails.pii_protection |= self.pii_protection;
        if !self.blocked_topics.is_empty() {
            wizard.guardrails.blocked_topics = self.blocked_topics.clone();
        }
        if self.max_response_length.is_some() {
            wizard.guardrails.max_response_length = self.max_response_length;
        }
        self.access.apply(&mut wizard.access)
    }
}

fn parse_task(raw: &str) -> AgentTask {
    match raw.split_once(':') {
        Some((name, instructions)) => AgentTask {
            name: name.trim().to_string(),
            instructions: instructions.trim().to_string(),
            ..Default::default()
        },
        None => AgentTask {
            name: raw.trim().to_string(),
            ..Default::default()
        },
    }
}

pub async fn handle_agents_command(
    opts: &GlobalOptions,
    cmd: Option<AgentsCommand>,
) -> anyhow::Result<()> {
    let ctx = CliContext::authenticated(opts).await?;

    match cmd.unwrap_or(AgentsCommand::List {
        published: false,
        format: OutputFormat::Text,
    }) {
        AgentsCommand::List { published, format } => cmd_agents_list(&ctx, published, format).await,
        AgentsCommand::Show { id, format } => cmd_agents_show(&ctx, &id, format).await,
        AgentsCommand::Create {
            agent_type,
            fields,
            publish,
        } => {
            let agent_type: AgentType = agent_type.parse().map_err(|e: String| anyhow!(e))?;
            let mut wizard = AgentWizard::new(agent_type);
            fields.apply(&mut wizard)?;
            cmd_agents_save(&ctx, wizard, publish).await
        }
        AgentsCommand::Edit {
            id,
            fields,
            publish,
        } => {
            let agent = ctx.client.agents().get(&id).await?;
            let mut wizard = AgentWizard::edit(&agent);
            fields.apply(&mut wizard)?;
            cmd_agents_save(&ctx, wizard, publish).await
        }
        AgentsCommand::Publish { id } => {
            ctx.client.agents().publish(&id).await?;
            print_success(&format!("Agent {} published", id));
            Ok(())
        }
        AgentsCommand::Delete { id, yes } => {
            confirm_flag(yes, &format!("agent {}", id))?;
            ctx.client.agents().delete(&id).await?;
            print_success(&format!("Agent {} deleted", id));
            Ok(())
        }
    }
}

async fn cmd_agents_list(
    ctx: &CliContext,
    published_only: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let agents: Vec<Agent> = ctx
        .client
        .agents()
        .list()
        .await?
        .into_iter()
        .filter(|a| !published_only || a.is_published())
        .collect();

    if format.is_json() {
        return print_json(&agents);
    }

    if agents.is_empty() {
        print_empty(
            "agents",
            "Run 'agentloom agents create --name <name>' to build one.",
        );
        return Ok(());
    }

    println!("{}", "Agents".cyan().bold());
    println!();

    let mut table = new_table(&["ID", "Name", "Type", "Status", "Tools", "Updated"]);
    for agent in &agents {
        let status = match agent.status {
            AgentStatus::Published => Cell::new("Published").fg(Color::Green),
            AgentStatus::Draft => Cell::new("Draft").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&agent.id).fg(Color::DarkGrey),
            Cell::new(truncate(&agent.name, 32)),
            Cell::new(agent.agent_type.to_string()),
            status,
            Cell::new(agent.tool_ids.len()),
            Cell::new(format_time(
                agent.updated_at.or(agent.created_at),
                ctx.datetime_format(),
            )),
        ]);
    }

    println!("{table}");
    println!();
    println!("  Total: {} agents", agents.len());
    Ok(())
}

async fn cmd_agents_show(ctx: &CliContext, id: &str, format: OutputFormat) -> anyhow::Result<()> {
    let agent = ctx.client.agents().get(id).await?;
    if format.is_json() {
        return print_json(&agent);
    }

    println!("{} {}", "Agent".cyan().bold(), agent.name.bold());
    println!("{}", "═".repeat(40).dimmed());
    println!("  {:<14} {}", "ID:".bold(), agent.id);
    println!("  {:<14} {}", "Type:".bold(), agent.agent_type);
    println!("  {:<14} {}", "Status:".bold(), agent.status);
    if !agent.description.is_empty() {
        println!("  {:<14} {}", "Description:".bold(), agent.description);
    }
    if !agent.goal.is_empty() {
        println!("  {:<14} {}", "Goal:".bold(), agent.goal);
    }
    println!(
        "  {:<14} {}",
        "Access:".bold(),
        agent.access_control.access_type
    );

    if !agent.tasks.is_empty() {
        println!();
        println!("  {}", "Tasks".yellow().bold());
        for (i, task) in agent.tasks.iter().enumerate() {
            println!("    {}. {}", i + 1, task.name);
            if !task.instructions.is_empty() {
                println!("       {}", task.instructions.dimmed());
            }
        }
    }

    println!();
    println!("  {}", "Personality".yellow().bold());
    println!(
        "    tone {}, creativity {}/10, length {}/10",
        agent.personality.tone, agent.personality.creativity, agent.personality.length
    );

    let g = &agent.guardrails;
    println!();
    println!("  {}", "Guardrails".yellow().bold());
    println!(
        "    cite sources: {}  anti-hallucination: {}  PII protection: {}",
        yes_no(g.cite_sources),
        yes_no(g.anti_hallucination),
        yes_no(g.pii_protection)
    );
    if !g.blocked_topics.is_empty() {
        println!("    blocked topics: {}", g.blocked_topics.join(", "));
    }

    if !agent.tool_ids.is_empty() {
        println!();
        println!("  {} {}", "Tools:".yellow().bold(), agent.tool_ids.join(", "));
    }
    Ok(())
}

async fn cmd_agents_save(
    ctx: &CliContext,
    mut wizard: AgentWizard,
    publish: bool,
) -> anyhow::Result<()> {
    let verb = if wizard.editing_id().is_some() {
        "Updating"
    } else {
        "Creating"
    };
    println!("{} agent {}", verb.cyan().bold(), wizard.name.bold());
    complete_wizard(&mut wizard, false)?;

    let report = wizard.submit(&ctx.client, publish).await?;
    let action = if report.created { "created" } else { "updated" };
    print_success(&format!("Agent {} {}", report.agent_id, action));
    if report.published {
        println!("  {} published", "→".blue());
    }
    if let Some(err) = report.publish_error {
        return Err(anyhow!(
            "Agent {} was saved as a draft but not published: {}",
            report.agent_id,
            err
        ));
    }
    Ok(())
}

fn yes_no(v: bool) -> colored::ColoredString {
    if v {
        "yes".green()
    } else {
        "no".dimmed()
    }
}
