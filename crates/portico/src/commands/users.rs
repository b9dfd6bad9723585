//! Users command - user management.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};
use portico_client::{CreateUserRequest, ListUsersQuery, Role, UpdateUserRequest, User};

use super::{Context, print_json, truncate};
use crate::session;

/// Arguments for the users command.
#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List users
    List {
        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Users per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Filter by name or email
        #[arg(short, long)]
        keyword: Option<String>,
    },

    /// Show a single user
    Get {
        /// User ID
        id: u64,
    },

    /// Create a user
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Role (admin or user)
        #[arg(long, default_value = "user")]
        role: Role,
    },

    /// Update fields of a user
    Update {
        /// User ID
        id: u64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        role: Option<Role>,
    },

    /// Delete a user
    Delete {
        /// User ID
        id: u64,
    },
}

/// Run the users command.
pub async fn run(args: UsersArgs, ctx: &Context) -> Result<()> {
    let session = session::connect(ctx)?;
    let users = session.client.users();
    let green = Style::new().green();
    let dim = Style::new().dim();

    match args.command {
        UsersCommand::List {
            page,
            page_size,
            keyword,
        } => {
            let query = ListUsersQuery {
                page,
                page_size,
                keyword,
            };
            let list = users.list(query).await?.result;

            if ctx.json_output {
                return print_json(&list);
            }

            println!("{}", style("Users").bold());
            println!("{}", dim.apply_to("─".repeat(72)));
            if list.users.is_empty() {
                println!("{}", dim.apply_to("No users found"));
            } else {
                for user in &list.users {
                    print_row(user);
                }
            }
            println!();
            println!(
                "{}",
                dim.apply_to(format!(
                    "Page {} ({} per page), {} total",
                    list.page, list.page_size, list.total
                ))
            );
        }
        UsersCommand::Get { id } => {
            let user = users.get(id).await?.result;
            if ctx.json_output {
                return print_json(&user);
            }
            print_detail(&user, ctx.verbose);
        }
        UsersCommand::Create { name, email, role } => {
            let user = users
                .create(&CreateUserRequest { name, email, role })
                .await?
                .result;
            if ctx.json_output {
                return print_json(&user);
            }
            println!(
                "{} User created: {}",
                green.apply_to("✓"),
                dim.apply_to(user.id)
            );
        }
        UsersCommand::Update {
            id,
            name,
            email,
            role,
        } => {
            let request = UpdateUserRequest { name, email, role };
            if request.is_empty() {
                bail!("nothing to update; pass --name, --email or --role");
            }
            let user = users.update(id, &request).await?.result;
            if ctx.json_output {
                return print_json(&user);
            }
            println!(
                "{} User updated: {}",
                green.apply_to("✓"),
                dim.apply_to(user.id)
            );
        }
        UsersCommand::Delete { id } => {
            let response = users.delete(id).await?;
            if ctx.json_output {
                return print_json(&response);
            }
            println!("{} User deleted: {}", green.apply_to("✓"), dim.apply_to(id));
        }
    }

    Ok(())
}

fn print_row(user: &User) {
    let dim = Style::new().dim();
    println!(
        "{:>6}  {:<24} {:<30} {}",
        dim.apply_to(user.id),
        truncate(&user.name, 24),
        truncate(&user.email, 30),
        user.role
    );
}

fn print_detail(user: &User, verbose: bool) {
    let dim = Style::new().dim();
    println!("{}", style("User Details").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {:<8} {}", dim.apply_to("ID"), user.id);
    println!("  {:<8} {}", dim.apply_to("Name"), user.name);
    println!("  {:<8} {}", dim.apply_to("Email"), user.email);
    println!("  {:<8} {}", dim.apply_to("Role"), user.role);
    println!("  {:<8} {}", dim.apply_to("Created"), user.create_time);
    if verbose && let Some(avatar) = &user.avatar {
        println!("  {:<8} {}", dim.apply_to("Avatar"), avatar);
    }
}
