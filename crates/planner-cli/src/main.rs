mod auth;
mod events;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use planner_db::{Database, DropAndRecreate, Incremental, MigrationStrategy};
use planner_types::{EventId, Session};

use crate::auth::Credentials;
use crate::session::SessionFile;

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Keep a personal list of dated events")]
struct Cli {
    /// Database file
    #[arg(long, global = true, env = "PLANNER_DB_PATH", default_value = "planner.db")]
    db: PathBuf,

    /// Where `login` keeps the session between runs
    #[arg(
        long,
        global = true,
        env = "PLANNER_SESSION_PATH",
        default_value = "planner-session.json"
    )]
    session: PathBuf,

    /// Log in for this command only (overrides the saved session)
    #[arg(short, long, global = true, env = "PLANNER_USERNAME")]
    username: Option<String>,

    #[arg(short, long, global = true, env = "PLANNER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// On an outdated schema, drop all tables and start empty. Irreversible.
    #[arg(long, global = true)]
    destructive_upgrade: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register,
    /// Check credentials and save the session for later commands
    Login,
    /// Forget the saved session
    Logout,
    /// Add an event
    Add {
        name: String,

        /// YYYY-MM-DD
        date: String,

        /// Defaults to "10:00 AM"
        #[arg(short, long)]
        time: Option<String>,
    },
    /// List events by date and time
    List {
        /// Only events whose name or date contains this text (any case)
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Replace an event's name, date and time
    Update {
        id: i64,

        name: String,

        /// YYYY-MM-DD
        date: String,

        #[arg(short, long)]
        time: Option<String>,
    },
    /// Delete an event
    Delete { id: i64 },
}

fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planner_cli=info,planner_db=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let strategy: &dyn MigrationStrategy = if cli.destructive_upgrade {
        &DropAndRecreate
    } else {
        &Incremental
    };
    let db = Database::open_with(&cli.db, strategy)
        .with_context(|| format!("Could not open database {}", cli.db.display()))?;

    let session_file = SessionFile::new(cli.session);

    match cli.command {
        Commands::Register => {
            let creds = Credentials::new(cli.username, cli.password)?;
            let session = auth::register(&db, &creds)?;
            println!("Account created: {} (id {})", session.username, session.account_id);
        }
        Commands::Login => {
            let creds = Credentials::new(cli.username, cli.password)?;
            let session = auth::login(&db, &creds)?;
            session_file.save(&session)?;
            print_session(&session)?;
        }
        Commands::Logout => {
            if session_file.clear()? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }
        Commands::Add { name, date, time } => {
            let session = session::current(&db, &session_file, cli.username, cli.password)?;
            let fields = events::validate_fields(&name, &date, time)?;
            let id = events::add(&db, &session, &fields)?;
            println!("Added event {}", id);
        }
        Commands::List { filter, json } => {
            let session = session::current(&db, &session_file, cli.username, cli.password)?;
            let list = events::list(&db, &session, filter.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                print!("{}", events::render_table(&list));
            }
        }
        Commands::Update {
            id,
            name,
            date,
            time,
        } => {
            let session = session::current(&db, &session_file, cli.username, cli.password)?;
            let fields = events::validate_fields(&name, &date, time)?;
            events::update(&db, &session, EventId(id), &fields)?;
            println!("Updated event {}", id);
        }
        Commands::Delete { id } => {
            let session = session::current(&db, &session_file, cli.username, cli.password)?;
            events::delete(&db, &session, EventId(id))?;
            println!("Deleted event {}", id);
        }
    }

    Ok(())
}

fn print_session(session: &Session) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(session)?);
    Ok(())
}
