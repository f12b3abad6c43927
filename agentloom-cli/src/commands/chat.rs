use agentloom_core::{ChatSession, TurnOutcome};
use clap::Args;
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::context::{CliContext, GlobalOptions};
use crate::output::TerminalRenderer;

#[derive(Args)]
pub struct ChatArgs {
    #[arg(help = "Agent id")]
    agent_id: String,

    #[arg(help = "Message to send; omit for an interactive session")]
    message: Option<String>,

    #[arg(long, help = "Use the builder test endpoint instead of the live one")]
    test: bool,

    #[arg(
        short,
        long,
        conflicts_with = "test",
        help = "Continue an existing conversation (live endpoint only)"
    )]
    conversation: Option<String>,
}

pub async fn handle_chat_command(opts: &GlobalOptions, args: ChatArgs) -> anyhow::Result<()> {
    let ctx = CliContext::authenticated(opts).await?;

    let mut session = match &args.conversation {
        _ if args.test => ChatSession::for_testing(&args.agent_id),
        Some(id) => ChatSession::resume(&args.agent_id, id),
        None => ChatSession::new(&args.agent_id),
    };
    let mut renderer = TerminalRenderer::stdout(ctx.config.display.show_sources);

    if let Some(message) = &args.message {
        let outcome = session.send(&ctx.client, message, &mut renderer).await;
        print_conversation_hint(&session, &outcome);
        return if outcome.is_success() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                outcome.error.unwrap_or_else(|| "Chat failed".to_string())
            ))
        };
    }

    println!(
        "{} {}{}",
        "Chatting with".cyan().bold(),
        args.agent_id.bold(),
        if args.test { " (test mode)" } else { "" }
    );
    println!(
        "{}",
        "Type a message and press Enter. /new starts over, /exit quits.".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you>".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/exit" | "/quit" => break,
            "/new" => {
                session.reset();
                println!("{}", "Started a new conversation.".dimmed());
                continue;
            }
            _ => {}
        }

        let outcome = session.send(&ctx.client, line, &mut renderer).await;
        debug!(state = ?outcome.state, "Turn complete");
    }

    if let Some(id) = session.conversation_id() {
        println!();
        println!("{} {}", "Conversation:".dimmed(), id);
    }
    Ok(())
}

fn print_conversation_hint(session: &ChatSession, outcome: &TurnOutcome) {
    if !outcome.is_success() {
        return;
    }
    if let Some(id) = session.conversation_id() {
        println!(
            "{}",
            format!("Continue with --conversation {}", id).dimmed()
        );
    }
}
