use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};

use super::confirm_flag;
use crate::context::{CliContext, GlobalOptions};
use crate::output::{format_time, new_table, print_empty, print_json, print_success, truncate, OutputFormat};

#[derive(Subcommand)]
pub enum KnowledgeCommand {
    #[command(about = "List knowledge bases")]
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "List the documents of a knowledge base")]
    Documents {
        tool_id: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Print one document")]
    Show {
        tool_id: String,
        document_id: String,
    },

    #[command(about = "Delete a document")]
    Delete {
        tool_id: String,
        document_id: String,

        #[arg(short, long, help = "Confirm deletion")]
        yes: bool,
    },
}

pub async fn handle_knowledge_command(
    opts: &GlobalOptions,
    cmd: Option<KnowledgeCommand>,
) -> anyhow::Result<()> {
    let ctx = CliContext::authenticated(opts).await?;
    let knowledge = ctx.client.knowledge();

    match cmd.unwrap_or(KnowledgeCommand::List {
        format: OutputFormat::Text,
    }) {
        KnowledgeCommand::List { format } => {
            let bases = knowledge.bases().await?;
            if format.is_json() {
                return print_json(&bases);
            }
            if bases.is_empty() {
                print_empty(
                    "knowledge bases",
                    "Create one with 'agentloom tools create --type knowledge'.",
                );
                return Ok(());
            }

            println!("{}", "Knowledge Bases".cyan().bold());
            println!();
            let mut table = new_table(&["ID", "Name", "Type", "Documents"]);
            for base in &bases {
                table.add_row(vec![
                    Cell::new(&base.id).fg(Color::DarkGrey),
                    Cell::new(truncate(&base.name, 40)),
                    Cell::new(base.tool_type.label()),
                    Cell::new(base.document_count.unwrap_or(0)),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        KnowledgeCommand::Documents { tool_id, format } => {
            let documents = knowledge.documents(&tool_id).await?;
            if format.is_json() {
                return print_json(&documents);
            }
            if documents.is_empty() {
                print_empty("documents", "");
                return Ok(());
            }

            let mut table = new_table(&["ID", "Name", "Source", "Status", "Chunks", "Added"]);
            for doc in &documents {
                table.add_row(vec![
                    Cell::new(&doc.id).fg(Color::DarkGrey),
                    Cell::new(truncate(&doc.name, 40)),
                    Cell::new(doc.source_type.as_deref().unwrap_or("-")),
                    Cell::new(doc.status.as_deref().unwrap_or("-")),
                    Cell::new(
                        doc.chunk_count
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    Cell::new(format_time(doc.created_at, ctx.datetime_format())),
                ]);
            }
            println!("{table}");
            println!();
            println!("  Total: {} documents", documents.len());
            Ok(())
        }
        KnowledgeCommand::Show {
            tool_id,
            document_id,
        } => {
            let doc = knowledge.document(&tool_id, &document_id).await?;
            println!("{}", doc.name.cyan().bold());
            if let Some(url) = &doc.url {
                println!("{}", url.dimmed());
            }
            println!("{}", "─".repeat(40).dimmed());
            println!("{}", doc.content.as_deref().unwrap_or("(no text content)"));
            Ok(())
        }
        KnowledgeCommand::Delete {
            tool_id,
            document_id,
            yes,
        } => {
            confirm_flag(yes, &format!("document {}", document_id))?;
            knowledge.delete_document(&tool_id, &document_id).await?;
            print_success(&format!("Document {} deleted", document_id));
            Ok(())
        }
    }
}
