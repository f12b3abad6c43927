use agentloom_core::{navigate, Page, PageData, PageSnapshot, UiState};
use clap::Args;
use colored::Colorize;
use comfy_table::{Cell, Color};
use serde_json::json;

use crate::context::{CliContext, GlobalOptions};
use crate::output::{format_time, new_table, print_empty, print_json, truncate, OutputFormat};

#[derive(Args)]
pub struct OpenArgs {
    #[arg(
        default_value = "dashboard",
        help = "Page to open: dashboard, agents, tools, knowledge, knowledge/<tool-id>, \
                conversations/<agent-id>, approvals, security/users, security/roles, \
                security/groups, security/org-chart, security/audit"
    )]
    page: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

pub async fn handle_open_command(opts: &GlobalOptions, args: OpenArgs) -> anyhow::Result<()> {
    let page: Page = args.page.parse().map_err(anyhow::Error::msg)?;
    let ctx = CliContext::authenticated(opts).await?;
    let gate = ctx.permission_gate().await?;

    let snapshot = navigate(&ctx.client, &gate, page).await?;

    if args.format.is_json() {
        let actions: Vec<_> = snapshot
            .visible_actions()
            .map(|(a, state)| {
                json!({
                    "id": a.id,
                    "label": a.label,
                    "enabled": state.is_usable(),
                })
            })
            .collect();
        return print_json(&json!({
            "page": snapshot.page.to_string(),
            "loaded_at": snapshot.loaded_at,
            "content": snapshot.data,
            "actions": actions,
        }));
    }

    println!("{}", snapshot.page.title().cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    render_data(&ctx, &snapshot);
    render_actions(&snapshot);
    Ok(())
}

fn render_data(ctx: &CliContext, snapshot: &PageSnapshot) {
    let fmt = ctx.datetime_format();
    if snapshot.data.is_empty() {
        print_empty("entries", "");
        return;
    }

    match &snapshot.data {
        PageData::Dashboard(summary) => {
            println!("  {:<20} {}", "Agents:".bold(), summary.agent_count);
            println!("  {:<20} {}", "Published:".bold(), summary.published_agents);
            println!("  {:<20} {}", "Tools:".bold(), summary.tool_count);
            match summary.pending_approvals {
                Some(n) => println!("  {:<20} {}", "Pending approvals:".bold(), n),
                None => println!("  {:<20} {}", "Pending approvals:".bold(), "-".dimmed()),
            }
            if !summary.recent_agents.is_empty() {
                println!();
                println!("  {}", "Recently updated".bold());
                for agent in &summary.recent_agents {
                    println!(
                        "    {} {}",
                        agent.name,
                        format_time(agent.updated_at.or(agent.created_at), fmt).dimmed()
                    );
                }
            }
        }
        PageData::Agents(agents) => {
            let mut table = new_table(&["ID", "Name", "Type", "Status"]);
            for a in agents {
                table.add_row(vec![
                    Cell::new(&a.id).fg(Color::DarkGrey),
                    Cell::new(truncate(&a.name, 36)),
                    Cell::new(a.agent_type),
                    Cell::new(a.status),
                ]);
            }
            println!("{table}");
        }
        PageData::Tools(tools) | PageData::Knowledge(tools) => {
            let mut table = new_table(&["ID", "Name", "Type", "Documents"]);
            for t in tools {
                table.add_row(vec![
                    Cell::new(&t.id).fg(Color::DarkGrey),
                    Cell::new(truncate(&t.name, 36)),
                    Cell::new(t.tool_type.label()),
                    Cell::new(
                        t.document_count
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                ]);
            }
            println!("{table}");
        }
        PageData::Documents(docs) => {
            let mut table = new_table(&["ID", "Name", "Status", "Added"]);
            for d in docs {
                table.add_row(vec![
                    Cell::new(&d.id).fg(Color::DarkGrey),
                    Cell::new(truncate(&d.name, 40)),
                    Cell::new(d.status.as_deref().unwrap_or("-")),
                    Cell::new(format_time(d.created_at, fmt)),
                ]);
            }
            println!("{table}");
        }
        PageData::Conversations(conversations) => {
            let mut table = new_table(&["ID", "Title", "Messages", "Updated"]);
            for c in conversations {
                table.add_row(vec![
                    Cell::new(&c.id).fg(Color::DarkGrey),
                    Cell::new(truncate(c.title.as_deref().unwrap_or("(untitled)"), 40)),
                    Cell::new(c.message_count),
                    Cell::new(format_time(c.updated_at, fmt)),
                ]);
            }
            println!("{table}");
        }
        PageData::Approvals(approvals) => {
            for a in approvals {
                println!(
                    "  {} {} {}",
                    a.id.dimmed(),
                    a.agent_name.as_deref().unwrap_or(&a.agent_id).bold(),
                    truncate(&a.summary, 60)
                );
            }
        }
        PageData::Users(users) => {
            for u in users {
                let status = if u.is_active { "" } else { " (disabled)" };
                println!("  {} {} <{}>{}", u.id.dimmed(), u.name.bold(), u.email, status);
            }
        }
        PageData::Roles(roles) => {
            for r in roles {
                println!(
                    "  {} {}",
                    r.name.bold(),
                    truncate(&r.permissions.join(", "), 70).dimmed()
                );
            }
        }
        PageData::Groups(groups) => {
            for g in groups {
                println!("  {} {} members", g.name.bold(), g.member_ids.len());
            }
        }
        PageData::OrgChart(roots) => {
            for root in roots {
                for (depth, node) in root.walk() {
                    println!("{}{}", "  ".repeat(depth + 1), node.name);
                }
            }
        }
        PageData::Audit(entries) => {
            for e in entries {
                println!(
                    "  {} {} {}",
                    e.timestamp.format(fmt).to_string().dimmed(),
                    e.user_email.as_deref().unwrap_or("-"),
                    e.action.bold()
                );
            }
        }
    }
}

fn render_actions(snapshot: &PageSnapshot) {
    let actions: Vec<_> = snapshot.visible_actions().collect();
    if actions.is_empty() {
        return;
    }
    println!();
    println!("  {}", "Actions".bold());
    for (affordance, state) in actions {
        match state {
            UiState::Enabled => println!("    {} {}", "●".green(), affordance.label),
            UiState::Disabled { reason } => println!(
                "    {} {} {}",
                "○".dimmed(),
                affordance.label.dimmed(),
                format!("({})", reason).dimmed()
            ),
            UiState::Hidden => {}
        }
    }
}
