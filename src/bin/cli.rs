use accounts_api::{
    config::AppConfig,
    db,
    models::Role,
    repositories::user_repository::SqliteUserRepository,
    services::{
        user_service::{CreateUserRequest, UpdatePasswordRequest, UserService},
        Clock, SystemClock,
    },
};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "accounts-cli")]
#[command(about = "CLI tool for managing accounts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        user_name: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// One of admin, seller, user
        #[arg(short, long, default_value = "user")]
        role: Role,

        /// Skip the activation email flow
        #[arg(long)]
        active: bool,

        /// Grant staff access
        #[arg(long)]
        staff: bool,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Delete a user
    Delete {
        /// Email address of the user to delete
        #[arg(short, long)]
        email: String,
    },

    /// Activate a user without a token
    Activate {
        /// Email address of the user to activate
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password for a user
    SetPassword {
        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

/// Uses the flag when given, otherwise prompts twice.
fn resolve_password(given: Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }

    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let user_service = UserService::new(user_repository, clock);

    match cli.command {
        Commands::User { command } => run_user_command(&user_service, command).await?,
    }

    Ok(())
}

async fn run_user_command(user_service: &UserService, command: UserCommands) -> anyhow::Result<()> {
    match command {
        UserCommands::Create {
            email,
            user_name,
            password,
            role,
            active,
            staff,
        } => {
            let password = resolve_password(password, "Password")?;
            let user = user_service
                .create_user(CreateUserRequest {
                    email,
                    user_name,
                    password,
                    role,
                    mobile_number: None,
                    is_active: active,
                    is_staff: staff,
                })
                .await?;

            println!("User created");
            println!("  ID: {}", user.id);
            println!("  Email: {}", user.email);
            println!("  Role: {}", user.role);
            println!("  Active: {}", user.is_active);
        }

        UserCommands::List { limit, offset } => {
            let users = user_service.list_users(Some(limit), Some(offset)).await?;
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }

            println!(
                "{:<5} {:<40} {:<8} {:<7} {:<20}",
                "ID", "Email", "Role", "Active", "Joined"
            );
            println!("{}", "-".repeat(84));
            for user in users {
                println!(
                    "{:<5} {:<40} {:<8} {:<7} {:<20}",
                    user.id,
                    user.email,
                    user.role,
                    if user.is_active { "yes" } else { "no" },
                    user.date_joined.format("%Y-%m-%d %H:%M")
                );
            }
        }

        UserCommands::Delete { email } => {
            let user = find_or_fail(user_service, &email).await?;
            user_service.delete_user(user.id).await?;
            println!("User '{}' deleted", email);
        }

        UserCommands::Activate { email } => {
            let user = find_or_fail(user_service, &email).await?;
            if user.is_active {
                println!("User '{}' is already active", email);
            } else {
                user_service.activate_user(user.id).await?;
                println!("User '{}' activated", email);
            }
        }

        UserCommands::SetPassword { email, password } => {
            let user = find_or_fail(user_service, &email).await?;
            let new_password = resolve_password(password, "New password")?;
            user_service
                .update_password(UpdatePasswordRequest {
                    user_id: user.id,
                    new_password,
                })
                .await?;
            println!("Password updated for '{}'", email);
        }
    }

    Ok(())
}

async fn find_or_fail(
    user_service: &UserService,
    email: &str,
) -> anyhow::Result<accounts_api::models::User> {
    user_service
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User '{}' not found", email))
}
