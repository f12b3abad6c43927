use agentloom_core::Role;
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};

use super::confirm_flag;
use crate::context::{CliContext, GlobalOptions};
use crate::output::{
    format_time, new_table, print_empty, print_json, print_sources, print_success, truncate,
    OutputFormat,
};

#[derive(Subcommand)]
pub enum ConversationsCommand {
    #[command(about = "List the conversations of an agent")]
    List {
        agent_id: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Print a conversation with its messages")]
    Show {
        id: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Delete a conversation")]
    Delete {
        id: String,

        #[arg(short, long, help = "Confirm deletion")]
        yes: bool,
    },
}

pub async fn handle_conversations_command(
    opts: &GlobalOptions,
    cmd: ConversationsCommand,
) -> anyhow::Result<()> {
    let ctx = CliContext::authenticated(opts).await?;

    match cmd {
        ConversationsCommand::List { agent_id, format } => {
            let conversations = ctx.client.agents().conversations(&agent_id).await?;
            if format.is_json() {
                return print_json(&conversations);
            }
            if conversations.is_empty() {
                print_empty(
                    "conversations",
                    &format!("Start one with 'agentloom chat {}'.", agent_id),
                );
                return Ok(());
            }

            let mut table = new_table(&["ID", "Title", "Messages", "Updated"]);
            for c in &conversations {
                table.add_row(vec![
                    Cell::new(&c.id).fg(Color::DarkGrey),
                    Cell::new(truncate(c.title.as_deref().unwrap_or("(untitled)"), 48)),
                    Cell::new(c.message_count),
                    Cell::new(format_time(c.updated_at, ctx.datetime_format())),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        ConversationsCommand::Show { id, format } => {
            let conversation = ctx.client.conversations().get(&id).await?;
            if format.is_json() {
                return print_json(&conversation);
            }

            println!(
                "{}",
                conversation
                    .title
                    .as_deref()
                    .unwrap_or("Conversation")
                    .cyan()
                    .bold()
            );
            println!("{}", "═".repeat(40).dimmed());
            for message in &conversation.messages {
                let who = match message.role {
                    Role::User => "you>".green().bold(),
                    Role::Assistant => "agent>".cyan().bold(),
                    Role::System => "system>".dimmed(),
                };
                println!("{} {}", who, message.content);
                if ctx.config.display.show_sources {
                    print_sources(&message.sources);
                }
            }
            Ok(())
        }
        ConversationsCommand::Delete { id, yes } => {
            confirm_flag(yes, &format!("conversation {}", id))?;
            ctx.client.conversations().delete(&id).await?;
            print_success(&format!("Conversation {} deleted", id));
            Ok(())
        }
    }
}
