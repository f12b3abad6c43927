#![allow(
    dead_code,
    unused_imports,
    clippy::too_many_arguments,
    clippy::needless_borrows_for_generic_args,
    clippy::useless_format,
    clippy::len_zero,
    clippy::field_reassign_with_default
)]

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod context;
mod output;

use agentloom_core::{AgentloomConfig, AgentloomError, CliErrorDisplay, LoggingConfig};
use commands::{
    handle_agents_command, handle_approvals_command, handle_auth_command, handle_chat_command,
    handle_config_command, handle_conversations_command, handle_knowledge_command,
    handle_open_command, handle_security_command, handle_tools_command, AgentsCommand,
    ApprovalsCommand, AuthCommand, ChatArgs, ConfigCommand, ConversationsCommand,
    KnowledgeCommand, OpenArgs, SecurityCommand, ToolsCommand,
};
use context::GlobalOptions;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "agentloom")]
#[command(version = VERSION)]
#[command(about = "Agentloom - build, test and chat with AI agents from the terminal")]
#[command(long_about = r#"
Agentloom talks to an agent builder server: create agents and the tools they
use, feed knowledge bases, chat with agents over a live stream, review
process approvals and administer users, roles and groups.

Start with 'agentloom login', then 'agentloom agents list' or
'agentloom chat <agent-id>'.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[arg(
        long,
        global = true,
        env = "AGENTLOOM_API_URL",
        help = "Override the API base URL"
    )]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Auth(AuthCommand),

    #[command(about = "Create, edit, publish and delete agents")]
    Agents {
        #[command(subcommand)]
        action: Option<AgentsCommand>,
    },

    #[command(about = "Create, edit, test and delete tools")]
    Tools {
        #[command(subcommand)]
        action: Option<ToolsCommand>,
    },

    #[command(about = "Chat with an agent (streams the reply)")]
    Chat(ChatArgs),

    #[command(about = "Browse knowledge bases and their documents")]
    Knowledge {
        #[command(subcommand)]
        action: Option<KnowledgeCommand>,
    },

    #[command(about = "List, show and delete conversations")]
    Conversations {
        #[command(subcommand)]
        action: ConversationsCommand,
    },

    #[command(about = "Review pending process approvals")]
    Approvals {
        #[command(subcommand)]
        action: Option<ApprovalsCommand>,
    },

    #[command(about = "Security center: users, roles, groups, org chart, audit, MFA")]
    Security {
        #[command(subcommand)]
        action: SecurityCommand,
    },

    #[command(about = "Open a page (dashboard, agents, security/users, ...)")]
    Open(OpenArgs),

    #[command(about = "Show or initialise the configuration file")]
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A broken config file is reported by the command itself; logging falls back to defaults.
    let logging = AgentloomConfig::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    init_logging(cli.verbose, &logging);

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AgentloomError>() {
                Some(err) => eprint!("{}: {}", "Error".red().bold(), CliErrorDisplay::new(err)),
                None => eprintln!("{}: {}", "Error".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let opts = GlobalOptions {
        api_url: cli.api_url,
    };

    match cli.command {
        Commands::Auth(cmd) => handle_auth_command(&opts, cmd).await,
        Commands::Agents { action } => handle_agents_command(&opts, action).await,
        Commands::Tools { action } => handle_tools_command(&opts, action).await,
        Commands::Chat(args) => handle_chat_command(&opts, args).await,
        Commands::Knowledge { action } => handle_knowledge_command(&opts, action).await,
        Commands::Conversations { action } => handle_conversations_command(&opts, action).await,
        Commands::Approvals { action } => handle_approvals_command(&opts, action).await,
        Commands::Security { action } => handle_security_command(&opts, action).await,
        Commands::Open(args) => handle_open_command(&opts, args).await,
        Commands::Config { action } => handle_config_command(&opts, action),
        Commands::Version { detailed } => cmd_version(detailed),
    }
}

fn cmd_version(detailed: bool) -> anyhow::Result<()> {
    if detailed {
        println!("{}", "Agentloom Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!();
        println!("  {}", "Tool Types:".bold());
        for tool_type in agentloom_core::ToolType::ALL {
            println!("    {:<12} {}", tool_type.as_str(), tool_type.label().dimmed());
        }
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("agentloom {}", VERSION);
    }

    Ok(())
}
