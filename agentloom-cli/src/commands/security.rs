use agentloom_core::{AuditQuery, OrgNode, UserDraft};
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};

use super::confirm_flag;
use crate::context::{CliContext, GlobalOptions};
use crate::output::{format_time, new_table, print_empty, print_json, print_success, truncate, OutputFormat};

#[derive(Subcommand)]
pub enum SecurityCommand {
    #[command(about = "Manage users")]
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },

    #[command(about = "List or create roles")]
    Roles {
        #[command(subcommand)]
        action: RolesCommand,
    },

    #[command(about = "Manage groups and their members")]
    Groups {
        #[command(subcommand)]
        action: GroupsCommand,
    },

    #[command(about = "Print the organisation chart")]
    OrgChart {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Search the audit log")]
    Audit {
        #[arg(long, help = "Only entries for this user id")]
        user: Option<String>,

        #[arg(long, help = "Only entries with this action")]
        action: Option<String>,

        #[arg(short = 'n', long, default_value_t = 50)]
        limit: u32,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Multi-factor authentication for your own account")]
    Mfa {
        #[command(subcommand)]
        action: MfaCommand,
    },
}

#[derive(Subcommand)]
pub enum UsersCommand {
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    Show {
        id: String,
    },
    Create {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long, help = "Initial password")]
        password: Option<String>,
        #[arg(long = "role", help = "Role id (repeatable)")]
        roles: Vec<String>,
        #[arg(long = "group", help = "Group id (repeatable)")]
        groups: Vec<String>,
        #[arg(long)]
        manager: Option<String>,
    },
    Update {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long = "role", help = "Replace roles (repeatable)")]
        roles: Vec<String>,
        #[arg(long = "group", help = "Replace groups (repeatable)")]
        groups: Vec<String>,
        #[arg(long)]
        manager: Option<String>,
        #[arg(long, conflicts_with = "deactivate")]
        activate: bool,
        #[arg(long)]
        deactivate: bool,
    },
    Delete {
        id: String,
        #[arg(short, long, help = "Confirm deletion")]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum RolesCommand {
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long = "permission", help = "Permission such as agents:create (repeatable)")]
        permissions: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum GroupsCommand {
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    AddMember {
        group_id: String,
        user_id: String,
    },
    RemoveMember {
        group_id: String,
        user_id: String,
    },
}

#[derive(Subcommand)]
pub enum MfaCommand {
    #[command(about = "Start enrolment: prints the secret and backup codes")]
    Setup,
    #[command(about = "Confirm enrolment with a code from the authenticator app")]
    Enable { code: String },
    Disable { code: String },
}

pub async fn handle_security_command(
    opts: &GlobalOptions,
    cmd: SecurityCommand,
) -> anyhow::Result<()> {
    let ctx = CliContext::authenticated(opts).await?;

    match cmd {
        SecurityCommand::Users { action } => cmd_users(&ctx, action).await,
        SecurityCommand::Roles { action } => cmd_roles(&ctx, action).await,
        SecurityCommand::Groups { action } => cmd_groups(&ctx, action).await,
        SecurityCommand::OrgChart { format } => {
            let roots = ctx.client.security().org_chart().await?;
            if format.is_json() {
                return print_json(&roots);
            }
            if roots.is_empty() {
                print_empty("org chart entries", "");
                return Ok(());
            }
            println!("{}", "Organisation".cyan().bold());
            println!();
            for root in &roots {
                print_org_tree(root);
            }
            Ok(())
        }
        SecurityCommand::Audit {
            user,
            action,
            limit,
            format,
        } => {
            let query = AuditQuery {
                user_id: user,
                action,
                limit: Some(limit),
            };
            cmd_audit(&ctx, &query, format).await
        }
        SecurityCommand::Mfa { action } => cmd_mfa(&ctx, action).await,
    }
}

async fn cmd_users(ctx: &CliContext, action: UsersCommand) -> anyhow::Result<()> {
    let security = ctx.client.security();
    match action {
        UsersCommand::List { format } => {
            let users = security.users().await?;
            if format.is_json() {
                return print_json(&users);
            }
            if users.is_empty() {
                print_empty("users", "");
                return Ok(());
            }
            let mut table = new_table(&["ID", "Name", "Email", "Roles", "MFA", "Status", "Last login"]);
            for u in &users {
                table.add_row(vec![
                    Cell::new(&u.id).fg(Color::DarkGrey),
                    Cell::new(truncate(&u.name, 28)),
                    Cell::new(&u.email),
                    Cell::new(u.role_ids.len()),
                    if u.mfa_enabled {
                        Cell::new("on").fg(Color::Green)
                    } else {
                        Cell::new("off").fg(Color::DarkGrey)
                    },
                    if u.is_active {
                        Cell::new("Active").fg(Color::Green)
                    } else {
                        Cell::new("Disabled").fg(Color::Yellow)
                    },
                    Cell::new(format_time(u.last_login, ctx.datetime_format())),
                ]);
            }
            println!("{table}");
            println!();
            println!("  Total: {} users", users.len());
            Ok(())
        }
        UsersCommand::Show { id } => {
            let user = security.user(&id).await?;
            print_json(&user)
        }
        UsersCommand::Create {
            email,
            name,
            password,
            roles,
            groups,
            manager,
        } => {
            let draft = UserDraft {
                email: Some(email.clone()),
                name: Some(name),
                password,
                role_ids: (!roles.is_empty()).then_some(roles),
                group_ids: (!groups.is_empty()).then_some(groups),
                manager_id: manager,
                is_active: None,
            };
            let id = security.create_user(&draft).await?;
            print_success(&format!("User {} created ({})", email, id));
            Ok(())
        }
        UsersCommand::Update {
            id,
            name,
            roles,
            groups,
            manager,
            activate,
            deactivate,
        } => {
            let draft = UserDraft {
                name,
                role_ids: (!roles.is_empty()).then_some(roles),
                group_ids: (!groups.is_empty()).then_some(groups),
                manager_id: manager,
                is_active: match (activate, deactivate) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                ..Default::default()
            };
            security.update_user(&id, &draft).await?;
            print_success(&format!("User {} updated", id));
            Ok(())
        }
        UsersCommand::Delete { id, yes } => {
            confirm_flag(yes, &format!("user {}", id))?;
            security.delete_user(&id).await?;
            print_success(&format!("User {} deleted", id));
            Ok(())
        }
    }
}

async fn cmd_roles(ctx: &CliContext, action: RolesCommand) -> anyhow::Result<()> {
    let security = ctx.client.security();
    match action {
        RolesCommand::List { format } => {
            let roles = security.roles().await?;
            if format.is_json() {
                return print_json(&roles);
            }
            let mut table = new_table(&["ID", "Name", "Permissions", "System"]);
            for r in &roles {
                table.add_row(vec![
                    Cell::new(&r.id).fg(Color::DarkGrey),
                    Cell::new(&r.name),
                    Cell::new(truncate(&r.permissions.join(", "), 60)),
                    Cell::new(if r.is_system { "yes" } else { "" }),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        RolesCommand::Create {
            name,
            description,
            permissions,
        } => {
            let id = security
                .create_role(&name, &description, &permissions)
                .await?;
            print_success(&format!("Role {} created ({})", name, id));
            Ok(())
        }
    }
}

async fn cmd_groups(ctx: &CliContext, action: GroupsCommand) -> anyhow::Result<()> {
    let security = ctx.client.security();
    match action {
        GroupsCommand::List { format } => {
            let groups = security.groups().await?;
            if format.is_json() {
                return print_json(&groups);
            }
            let mut table = new_table(&["ID", "Name", "Members", "Description"]);
            for g in &groups {
                table.add_row(vec![
                    Cell::new(&g.id).fg(Color::DarkGrey),
                    Cell::new(&g.name),
                    Cell::new(g.member_ids.len()),
                    Cell::new(truncate(&g.description, 48)),
                ]);
            }
            println!("{table}");
            Ok(())
        }
        GroupsCommand::Create { name, description } => {
            let id = security.create_group(&name, &description).await?;
            print_success(&format!("Group {} created ({})", name, id));
            Ok(())
        }
        GroupsCommand::AddMember { group_id, user_id } => {
            security.add_group_member(&group_id, &user_id).await?;
            print_success(&format!("Added {} to group {}", user_id, group_id));
            Ok(())
        }
        GroupsCommand::RemoveMember { group_id, user_id } => {
            security.remove_group_member(&group_id, &user_id).await?;
            print_success(&format!("Removed {} from group {}", user_id, group_id));
            Ok(())
        }
    }
}

async fn cmd_audit(ctx: &CliContext, query: &AuditQuery, format: OutputFormat) -> anyhow::Result<()> {
    let entries = ctx.client.security().audit_log(query).await?;
    if format.is_json() {
        return print_json(&entries);
    }
    if entries.is_empty() {
        print_empty("audit entries", "");
        return Ok(());
    }

    let mut table = new_table(&["Time", "User", "Action", "Resource", "IP", "Result"]);
    for e in &entries {
        let resource = match (&e.resource_type, &e.resource_id) {
            (Some(t), Some(id)) => format!("{}/{}", t, id),
            (Some(t), None) => t.clone(),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(e.timestamp.format(ctx.datetime_format()).to_string()),
            Cell::new(e.user_email.as_deref().unwrap_or("-")),
            Cell::new(&e.action),
            Cell::new(resource),
            Cell::new(e.ip_address.as_deref().unwrap_or("-")),
            if e.success {
                Cell::new("ok").fg(Color::Green)
            } else {
                Cell::new("denied").fg(Color::Red)
            },
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn cmd_mfa(ctx: &CliContext, action: MfaCommand) -> anyhow::Result<()> {
    let security = ctx.client.security();
    match action {
        MfaCommand::Setup => {
            let setup = security.mfa_setup().await?;
            println!("{}", "MFA enrolment".cyan().bold());
            println!("  {:<14} {}", "Secret:".bold(), setup.secret);
            if let Some(url) = &setup.otpauth_url {
                println!("  {:<14} {}", "OTP URL:".bold(), url);
            }
            if !setup.backup_codes.is_empty() {
                println!();
                println!("  {}", "Backup codes (store them safely)".yellow().bold());
                for code in &setup.backup_codes {
                    println!("    {}", code);
                }
            }
            println!();
            println!(
                "  Finish with 'agentloom security mfa enable <code>'"
            );
            Ok(())
        }
        MfaCommand::Enable { code } => {
            security.mfa_enable(&code).await?;
            print_success("MFA enabled");
            Ok(())
        }
        MfaCommand::Disable { code } => {
            security.mfa_disable(&code).await?;
            print_success("MFA disabled");
            Ok(())
        }
    }
}

fn print_org_tree(root: &OrgNode) {
    for (depth, node) in root.walk() {
        let indent = "  ".repeat(depth + 1);
        let branch = if depth == 0 { "" } else { "└ " };
        match &node.title {
            Some(title) => println!("{}{}{} {}", indent, branch, node.name.bold(), title.dimmed()),
            None => println!("{}{}{}", indent, branch, node.name.bold()),
        }
    }
}
