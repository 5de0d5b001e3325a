mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use policy::Policy;
use runtime::{Message, Orchestrator, Part, Provider, TurnEvent, models};
use storage::{Event, EventKind, EventStore, SessionId};

use config::Config;
use error::{Error, Result};

const POLICY_FILE: &str = "skiff.toml";

#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "A provider-agnostic coding assistant for your terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// List the models in the catalog
    Models,
    /// List all sessions
    Sessions {
        /// Show only the last N sessions
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show event logs for a session
    Logs {
        /// Session ID (prefix match supported)
        #[arg(short, long)]
        session: String,
        /// Filter by event kind (message, tool_call, tool_result)
        #[arg(short, long)]
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Chat) | None => cmd_chat().await,
        Some(Commands::Models) => cmd_models(),
        Some(Commands::Sessions { limit }) => cmd_sessions(limit),
        Some(Commands::Logs { session, kind }) => cmd_logs(&session, kind.as_deref()),
    }
}

async fn cmd_chat() -> Result<()> {
    println!("skiff v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    let api_key = config.api_key()?;
    let model = models::resolve_api_model(&config.model).to_string();

    // Event store in the per-user data directory
    let data_dir = dirs_data_dir().unwrap_or_else(|| ".skiff".into());
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("events.db");
    let store = EventStore::open(&db_path)?;

    let policy = load_policy()?;
    println!(
        "Policy: {}",
        if std::path::Path::new(POLICY_FILE).exists() {
            POLICY_FILE
        } else {
            "default (workspace only)"
        }
    );

    let orch = Orchestrator::with_fs_tools(config.provider, api_key, &model, policy).build();

    let session_id = SessionId::new();
    store.append(&Event::new(session_id, EventKind::SessionStart))?;
    println!("Session ID: {session_id}");
    println!("Provider: {} ({model})", config.provider);
    println!("Type 'quit' or Ctrl+D to exit. Ctrl+C interrupts a running turn.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    // Conversation messages already written to the event log
    let mut logged = 0;

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        let mut turn = orch.submit(input)?;
        loop {
            tokio::select! {
                event = turn.recv() => {
                    let Some(event) = event else { break };
                    let terminal = event.is_terminal();
                    render_event(&event);
                    if terminal {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    orch.cancel();
                }
            }
        }

        logged = log_new_messages(&store, session_id, &orch.conversation().await, logged)?;
    }

    store.append(&Event::new(session_id, EventKind::SessionEnd))?;
    println!("\nSession ended.");
    Ok(())
}

fn render_event(event: &TurnEvent) {
    match event {
        TurnEvent::Text(text) => println!("\n{text}\n"),
        TurnEvent::ToolInvoked(name) => println!("  [tool] {name}"),
        TurnEvent::Done => {}
        TurnEvent::Cancelled => println!("\n(turn cancelled)\n"),
        TurnEvent::Failed(reason) => eprintln!("\nError: {reason}\n"),
    }
}

/// Append events for conversation messages past `logged`; returns the
/// new high-water mark.
fn log_new_messages(
    store: &EventStore,
    session_id: SessionId,
    messages: &[Message],
    logged: usize,
) -> Result<usize> {
    for message in &messages[logged..] {
        let role = match message.role {
            runtime::Role::User => storage::Role::User,
            runtime::Role::Assistant => storage::Role::Assistant,
            runtime::Role::Tool => storage::Role::Tool,
        };
        for part in &message.parts {
            match part {
                Part::Text { text } => {
                    store.append(&Event::message(session_id, role, text.clone()))?;
                }
                Part::ToolCall(call) => {
                    store.append(&Event::tool_call(
                        session_id,
                        call.name.clone(),
                        call.args.clone(),
                    ))?;
                }
                Part::ToolResult(result) => {
                    store.append(&Event::tool_result(
                        session_id,
                        result.name.clone(),
                        result.result.clone(),
                    ))?;
                }
            }
        }
    }
    Ok(messages.len())
}

fn cmd_models() -> Result<()> {
    for provider in [Provider::Gemini, Provider::OpenAi, Provider::Anthropic] {
        println!("{provider}:");
        for info in models::models_for(provider) {
            println!(
                "  {:<24}  {:<28}  {:>9} ctx",
                info.id, info.api_model, info.context_window
            );
        }
        println!();
    }
    Ok(())
}

fn cmd_sessions(limit: usize) -> Result<()> {
    let store = open_store()?;
    let sessions = store.list_sessions()?;

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<20}  {:<8}  STATUS",
        "SESSION ID", "STARTED", "MSGS"
    );
    println!("{}", "-".repeat(80));

    for summary in sessions.into_iter().take(limit) {
        let started = Local
            .from_utc_datetime(&summary.started_at.naive_utc())
            .format("%Y-%m-%d %H:%M");
        let status = if summary.ended_at.is_some() {
            "ended"
        } else {
            "active"
        };
        println!(
            "{:<36}  {:<20}  {:<8}  {status}",
            summary.id, started, summary.message_count
        );
    }

    Ok(())
}

fn cmd_logs(session_prefix: &str, kind_filter: Option<&str>) -> Result<()> {
    let store = open_store()?;
    let session_id = store.find_session(session_prefix)?;
    let events = store.load_events(session_id, kind_filter)?;

    if events.is_empty() {
        println!("No events found for session {session_id}");
        return Ok(());
    }

    println!("Session: {session_id}\n");
    for event in events {
        print_event(&event);
    }

    Ok(())
}

fn print_event(event: &Event) {
    let time = Local
        .from_utc_datetime(&event.timestamp.naive_utc())
        .format("%H:%M:%S");

    match &event.kind {
        EventKind::SessionStart => {
            println!("[{time}] === Session started ===");
        }
        EventKind::SessionEnd => {
            println!("[{time}] === Session ended ===");
        }
        EventKind::Message { role, content } => {
            let role_str = match role {
                storage::Role::User => "USER",
                storage::Role::Assistant => "ASSISTANT",
                storage::Role::Tool => "TOOL",
            };
            // Truncate long messages for display
            let display_content = if content.len() > 200 {
                format!("{}...", truncated(content, 200))
            } else {
                content.clone()
            };
            println!("[{time}] {role_str}: {display_content}");
        }
        EventKind::ToolCall { name, args } => {
            println!("[{time}] TOOL CALL: {name} {args}");
        }
        EventKind::ToolResult { name, output } => {
            println!("[{time}] TOOL RESULT: {name} {output}");
        }
    }
}

/// Longest prefix of at most `max` bytes that ends on a char boundary.
fn truncated(s: &str, max: usize) -> &str {
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn open_store() -> Result<EventStore> {
    let data_dir = dirs_data_dir().unwrap_or_else(|| ".skiff".into());
    let db_path = data_dir.join("events.db");

    if !db_path.exists() {
        return Err(Error::DatabaseNotFound { path: db_path });
    }

    Ok(EventStore::open(&db_path)?)
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/skiff"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("skiff"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("skiff"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

fn load_policy() -> Result<Policy> {
    let policy_path = PathBuf::from(POLICY_FILE);

    if policy_path.exists() {
        Ok(Policy::load(&policy_path)?)
    } else {
        Ok(Policy::workspace_only())
    }
}
