use agentloom_core::{
    required_config_fields, ScrapeRequest, TableEntry, TextEntry, Tool, ToolType, ToolWizard,
};
use anyhow::{anyhow, Context};
use clap::{Args, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, Color};
use serde_json::Value;
use std::path::PathBuf;

use super::{complete_wizard, confirm_flag, AccessArgs};
use crate::context::{CliContext, GlobalOptions};
use crate::output::{
    format_time, new_table, print_empty, print_json, print_success, print_warning, truncate,
    OutputFormat,
};

#[derive(Subcommand)]
pub enum ToolsCommand {
    #[command(about = "List tools")]
    List {
        #[arg(short = 't', long = "type", help = "Filter by tool type")]
        tool_type: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Show one tool in detail")]
    Show {
        id: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Create a tool, then upload or scrape its knowledge")]
    Create {
        #[arg(
            short = 't',
            long = "type",
            help = "api, website, database, knowledge, email, webhook, slack, spreadsheet"
        )]
        tool_type: String,

        #[command(flatten)]
        fields: ToolFields,
    },

    #[command(about = "Edit a tool; given sources are added to it")]
    Edit {
        id: String,

        #[command(flatten)]
        fields: ToolFields,
    },

    #[command(about = "Run the tool's connectivity test on the server")]
    Test { id: String },

    #[command(about = "Delete a tool")]
    Delete {
        id: String,

        #[arg(short, long, help = "Confirm deletion")]
        yes: bool,
    },

    #[command(about = "Show which config keys a tool type requires")]
    Types,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ToolFields {
    #[arg(short, long)]
    name: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    #[arg(
        short,
        long = "config",
        help = "Config entry KEY=VALUE; JSON values are parsed (repeatable)"
    )]
    config: Vec<String>,

    #[arg(long = "file", help = "Document to upload (repeatable)")]
    files: Vec<PathBuf>,

    #[arg(long = "url", help = "Page to scrape (repeatable)")]
    urls: Vec<String>,

    #[arg(long, help = "Follow links when scraping")]
    crawl: bool,

    #[arg(long, help = "Page limit per crawled URL")]
    max_pages: Option<u32>,

    #[arg(long = "text", help = "Text entry TITLE=CONTENT (repeatable)")]
    texts: Vec<String>,

    #[arg(long = "table", help = "Table NAME=path/to.csv (repeatable)")]
    tables: Vec<String>,

    #[command(flatten)]
    access: AccessArgs,

    #[arg(long = "can-edit", help = "User id allowed to edit (repeatable)")]
    can_edit: Vec<String>,

    #[arg(long = "can-delete", help = "User id allowed to delete (repeatable)")]
    can_delete: Vec<String>,

    #[arg(long = "can-execute", help = "User id allowed to run (repeatable)")]
    can_execute: Vec<String>,
}

impl ToolFields {
    fn apply(&self, wizard: &mut ToolWizard) -> anyhow::Result<()> {
        if let Some(name) = &self.name {
            wizard.name = name.clone();
        }
        if let Some(description) = &self.description {
            wizard.description = description.clone();
        }
        for entry in &self.config {
            let (key, value) = parse_config_entry(entry)?;
            wizard.set_config(key, value);
        }

        let sources = &mut wizard.sources;
        sources.files.extend(self.files.iter().cloned());
        for url in &self.urls {
            sources.urls.push(if self.crawl {
                ScrapeRequest {
                    url: url.clone(),
                    recursive: true,
                    max_pages: self.max_pages.unwrap_or(10),
                }
            } else {
                ScrapeRequest::single(url.clone())
            });
        }
        for raw in &self.texts {
            let (title, content) = raw
                .split_once('=')
                .ok_or_else(|| anyhow!("Text entry must be TITLE=CONTENT: {}", raw))?;
            sources.texts.push(TextEntry {
                title: title.trim().to_string(),
                content: content.to_string(),
            });
        }
        for raw in &self.tables {
            sources.tables.push(load_table(raw)?);
        }

        self.access.apply(&mut wizard.access)?;
        let permissions = &mut wizard.permissions;
        if !self.can_edit.is_empty() {
            permissions.can_edit_user_ids = self.can_edit.clone();
        }
        if !self.can_delete.is_empty() {
            permissions.can_delete_user_ids = self.can_delete.clone();
        }
        if !self.can_execute.is_empty() {
            permissions.can_execute_user_ids = self.can_execute.clone();
        }
        Ok(())
    }
}

fn parse_config_entry(entry: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = entry
        .split_once('=')
        .ok_or_else(|| anyhow!("Config entry must be KEY=VALUE: {}", entry))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("Config entry has an empty key: {}", entry));
    }
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Array(_) | Value::Object(_))) => v,
        _ => Value::String(raw.to_string()),
    };
    Ok((key.to_string(), value))
}

fn load_table(raw: &str) -> anyhow::Result<TableEntry> {
    let (name, path) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Table must be NAME=PATH: {}", raw))?;
    let text = std::fs::read_to_string(path.trim())
        .with_context(|| format!("Failed to read table file {}", path))?;
    TableEntry::from_csv(name.trim(), &text).ok_or_else(|| anyhow!("Table file {} is empty", path))
}

pub async fn handle_tools_command(
    opts: &GlobalOptions,
    cmd: Option<ToolsCommand>,
) -> anyhow::Result<()> {
    let cmd = cmd.unwrap_or(ToolsCommand::List {
        tool_type: None,
        format: OutputFormat::Text,
    });
    if let ToolsCommand::Types = cmd {
        return cmd_tools_types();
    }

    let ctx = CliContext::authenticated(opts).await?;
    match cmd {
        ToolsCommand::List { tool_type, format } => {
            cmd_tools_list(&ctx, tool_type.as_deref(), format).await
        }
        ToolsCommand::Show { id, format } => cmd_tools_show(&ctx, &id, format).await,
        ToolsCommand::Create { tool_type, fields } => {
            let tool_type: ToolType = tool_type.parse().map_err(|e: String| anyhow!(e))?;
            let mut wizard = ToolWizard::new(tool_type);
            fields.apply(&mut wizard)?;
            cmd_tools_save(&ctx, wizard).await
        }
        ToolsCommand::Edit { id, fields } => {
            let tool = ctx.client.tools().get(&id).await?;
            let mut wizard = ToolWizard::edit(&tool);
            fields.apply(&mut wizard)?;
            cmd_tools_save(&ctx, wizard).await
        }
        ToolsCommand::Test { id } => {
            let result = ctx.client.tools().test(&id).await?;
            let ok = result
                .get("success")
                .and_then(Value::as_bool)
                .unwrap_or(true);
            if ok {
                print_success(&format!("Tool {} responded", id));
            } else {
                print_warning(&format!("Tool {} test failed", id));
            }
            if let Some(message) = result.get("message").and_then(Value::as_str) {
                println!("  {}", message);
            }
            Ok(())
        }
        ToolsCommand::Delete { id, yes } => {
            confirm_flag(yes, &format!("tool {}", id))?;
            ctx.client.tools().delete(&id).await?;
            print_success(&format!("Tool {} deleted", id));
            Ok(())
        }
        ToolsCommand::Types => cmd_tools_types(),
    }
}

async fn cmd_tools_list(
    ctx: &CliContext,
    type_filter: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let filter = type_filter.map(|t| ToolType::from(t.to_lowercase()));
    let tools: Vec<Tool> = ctx
        .client
        .tools()
        .list()
        .await?
        .into_iter()
        .filter(|t| filter.as_ref().map_or(true, |f| &t.tool_type == f))
        .collect();

    if format.is_json() {
        return print_json(&tools);
    }

    if tools.is_empty() {
        print_empty(
            "tools",
            "Run 'agentloom tools create --type <type> --name <name>' to add one.",
        );
        return Ok(());
    }

    println!("{}", "Tools".cyan().bold());
    println!();

    let mut table = new_table(&["ID", "Name", "Type", "Access", "Documents", "Created"]);
    for tool in &tools {
        table.add_row(vec![
            Cell::new(&tool.id).fg(Color::DarkGrey),
            Cell::new(truncate(&tool.name, 32)),
            Cell::new(tool.tool_type.label()),
            Cell::new(tool.access_type.to_string()),
            Cell::new(
                tool.document_count
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format_time(tool.created_at, ctx.datetime_format())),
        ]);
    }

    println!("{table}");
    println!();
    println!("  Total: {} tools", tools.len());
    Ok(())
}

async fn cmd_tools_show(ctx: &CliContext, id: &str, format: OutputFormat) -> anyhow::Result<()> {
    let tool = ctx.client.tools().get(id).await?;
    if format.is_json() {
        return print_json(&tool);
    }

    println!("{} {}", "Tool".cyan().bold(), tool.name.bold());
    println!("{}", "═".repeat(40).dimmed());
    println!("  {:<14} {}", "ID:".bold(), tool.id);
    println!("  {:<14} {}", "Type:".bold(), tool.tool_type.label());
    println!("  {:<14} {}", "Access:".bold(), tool.access_type);
    if !tool.description.is_empty() {
        println!("  {:<14} {}", "Description:".bold(), tool.description);
    }

    if let Value::Object(config) = &tool.config {
        if !config.is_empty() {
            println!();
            println!("  {}", "Config".yellow().bold());
            for (key, value) in config {
                println!("    {:<20} {}", key, mask_secret(key, value));
            }
        }
    }
    Ok(())
}

async fn cmd_tools_save(ctx: &CliContext, mut wizard: ToolWizard) -> anyhow::Result<()> {
    let verb = if wizard.editing_id().is_some() {
        "Updating"
    } else {
        "Creating"
    };
    println!(
        "{} {} tool {}",
        verb.cyan().bold(),
        wizard.tool_type().label(),
        wizard.name.bold()
    );
    complete_wizard(&mut wizard, false)?;

    let pending = wizard.sources.len();
    let report = wizard.submit(&ctx.client).await?;
    let action = if report.created { "created" } else { "updated" };
    print_success(&format!("Tool {} {}", report.tool_id, action));

    if pending > 0 {
        println!(
            "  {} {}/{} sources added",
            "→".blue(),
            report.completed,
            pending
        );
    }
    for failure in &report.failures {
        print_warning(&failure.to_string());
    }
    Ok(())
}

fn cmd_tools_types() -> anyhow::Result<()> {
    let mut table = new_table(&["Type", "Name", "Required config"]);
    for tool_type in ToolType::ALL {
        let required = required_config_fields(&tool_type);
        table.add_row(vec![
            Cell::new(tool_type.as_str()),
            Cell::new(tool_type.label()),
            Cell::new(if required.is_empty() {
                "-".to_string()
            } else {
                required.join(", ")
            }),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn mask_secret(key: &str, value: &Value) -> String {
    let lower = key.to_lowercase();
    let secret = ["password", "token", "secret", "api_key", "connection_string"]
        .iter()
        .any(|s| lower.contains(s));
    match value {
        _ if secret => "****".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
