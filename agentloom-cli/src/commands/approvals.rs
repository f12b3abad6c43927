use agentloom_core::ApprovalDecision;
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};

use crate::context::{CliContext, GlobalOptions};
use crate::output::{format_time, new_table, print_empty, print_json, print_success, truncate, OutputFormat};

#[derive(Subcommand)]
pub enum ApprovalsCommand {
    #[command(about = "List approvals waiting for a decision")]
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Approve a pending step")]
    Approve {
        id: String,

        #[arg(short, long)]
        comment: Option<String>,
    },

    #[command(about = "Reject a pending step")]
    Reject {
        id: String,

        #[arg(short, long)]
        comment: Option<String>,
    },
}

pub async fn handle_approvals_command(
    opts: &GlobalOptions,
    cmd: Option<ApprovalsCommand>,
) -> anyhow::Result<()> {
    let ctx = CliContext::authenticated(opts).await?;

    match cmd.unwrap_or(ApprovalsCommand::List {
        format: OutputFormat::Text,
    }) {
        ApprovalsCommand::List { format } => {
            let pending = ctx.client.approvals().pending().await?;
            if format.is_json() {
                return print_json(&pending);
            }
            if pending.is_empty() {
                print_empty("pending approvals", "");
                return Ok(());
            }

            println!("{}", "Pending Approvals".cyan().bold());
            println!();
            let mut table = new_table(&["ID", "Agent", "Step", "Summary", "Requested"]);
            for a in &pending {
                table.add_row(vec![
                    Cell::new(&a.id).fg(Color::DarkGrey),
                    Cell::new(a.agent_name.as_deref().unwrap_or(&a.agent_id)),
                    Cell::new(a.step.as_deref().unwrap_or("-")),
                    Cell::new(truncate(&a.summary, 48)),
                    Cell::new(format_time(a.created_at, ctx.datetime_format())),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        ApprovalsCommand::Approve { id, comment } => {
            decide(&ctx, &id, ApprovalDecision::Approve, comment.as_deref()).await
        }
        ApprovalsCommand::Reject { id, comment } => {
            decide(&ctx, &id, ApprovalDecision::Reject, comment.as_deref()).await
        }
    }
}

async fn decide(
    ctx: &CliContext,
    id: &str,
    decision: ApprovalDecision,
    comment: Option<&str>,
) -> anyhow::Result<()> {
    ctx.client.approvals().decide(id, decision, comment).await?;
    let verb = match decision {
        ApprovalDecision::Approve => "approved",
        ApprovalDecision::Reject => "rejected",
    };
    print_success(&format!("Approval {} {}", id, verb));
    Ok(())
}
