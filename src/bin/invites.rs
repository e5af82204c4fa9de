//! Offline invite management against the server's database.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use gatehouse::db;
use gatehouse::error::AppError;
use gatehouse::validation::normalize_code;

#[derive(Parser)]
#[command(name = "gatehouse-invites", version, about = "Manage gatehouse invite codes")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:gatehouse.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a specific invite code
    Create { code: String },
    /// Create COUNT random invite codes
    Batch { count: usize },
    /// List invite codes
    List {
        /// Only show codes that have not been used
        #[arg(long)]
        unused: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let pool = db::create_pool(&cli.database_url).await?;

    match cli.command {
        Command::Create { code } => {
            let code = normalize_code(&code).map_err(|e| AppError::InvalidInput(e.to_string()))?;
            let invite = db::invites::create(&pool, &code).await?;
            println!("{}", invite.code);
        }
        Command::Batch { count } => {
            for code in db::invites::create_batch(&pool, count).await? {
                println!("{code}");
            }
        }
        Command::List { unused } => {
            for invite in db::invites::list_all(&pool).await? {
                if unused && invite.used {
                    continue;
                }
                match invite.used_at {
                    Some(used_at) => println!("{}\tused\t{}", invite.code, used_at),
                    None => println!("{}\tunused\t{}", invite.code, invite.created_at),
                }
            }
        }
    }

    Ok(())
}
