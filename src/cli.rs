//! CLI module — command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tokio::sync::mpsc;

use shipmate::agent::{AgentLoop, ChatEvent};
use shipmate::config::Config;
use shipmate::orders::OrderBook;
use shipmate::providers::{ClaudeProvider, LLMProvider, MockProvider};
use shipmate::session::SessionRegistry;
use shipmate::shipping::MockShippingProvider;
use shipmate::tools::ToolExecutor;

#[derive(Parser)]
#[command(name = "shipmate")]
#[command(version)]
#[command(about = "Conversational shipping assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the shipping assistant
    Chat {
        /// Direct message to process (non-interactive mode)
        #[arg(short, long)]
        message: Option<String>,
        /// Session key; conversations with the same key share history
        #[arg(long, default_value = "default")]
        session: String,
        /// Use the deterministic mock provider instead of the Anthropic API
        #[arg(long)]
        mock: bool,
    },
    /// List unfulfilled orders
    Orders {
        /// Maximum number of orders to show
        #[arg(long, default_value_t = 50)]
        limit: u32,
        /// Filter by order number, recipient name, or state
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the resolved configuration
    Config,
}

pub async fn run() -> Result<()> {
    // Load config early so logging can respect its level; fall back to
    // defaults if the config file is missing or unreadable.
    let config = Config::load().unwrap_or_default();
    init_logging(&config);
    let _ = Config::init_with(config.clone());

    let cli = Cli::parse();

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Chat {
            message,
            session,
            mock,
        }) => {
            cmd_chat(config, message, session, mock).await?;
        }
        Some(Commands::Orders { limit, search }) => {
            cmd_orders(limit, search).await;
        }
        Some(Commands::Config) => {
            cmd_config(&config)?;
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();
}

/// Interactive or single-message chat mode.
async fn cmd_chat(
    config: Config,
    message: Option<String>,
    session: String,
    mock: bool,
) -> Result<()> {
    let mock = mock || config.provider.mock_mode;

    let provider: Arc<dyn LLMProvider> = if mock {
        Arc::new(MockProvider::new())
    } else if let Some(api_key) = config.api_key() {
        Arc::new(ClaudeProvider::new(&api_key))
    } else {
        eprintln!("Warning: No API key configured. Set SHIPMATE_API_KEY or ANTHROPIC_API_KEY,");
        eprintln!("or add it to {:?}. Falling back to mock mode.", Config::path());
        eprintln!();
        Arc::new(MockProvider::new())
    };

    let registry = SessionRegistry::new(
        Arc::new(MockShippingProvider::new()),
        Arc::new(OrderBook::demo()),
        config.customer_context(),
    )
    .with_context(|| "Failed to create session storage")?;

    let agent = AgentLoop::new(provider, Arc::new(registry)).with_options(config.chat_options());

    if let Some(msg) = message {
        let answer = agent.process_message(&session, &msg, None).await;
        println!("{}", answer);
        return Ok(());
    }

    println!("Shipmate — shipping assistant for {}", config.store.name);
    println!("Type your message and press Enter. Type 'quit' or 'exit' to stop.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!();
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if input == "quit" || input == "exit" {
                    println!("Goodbye!");
                    break;
                }

                let (tx, printer) = spawn_event_printer();
                let answer = agent.process_message(&session, input, Some(&tx)).await;
                drop(tx);
                let _ = printer.await;

                println!("{}", answer);
                println!();
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Print tool activity while a turn runs. The final answer is printed by
/// the caller, so `Chunk`/`Complete` events are ignored here.
fn spawn_event_printer() -> (mpsc::Sender<ChatEvent>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(32);
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::ToolStart { tool } => {
                    println!("  [{}...]", tool);
                }
                ChatEvent::Status { .. }
                | ChatEvent::ToolComplete { .. }
                | ChatEvent::Chunk { .. }
                | ChatEvent::Complete { .. }
                | ChatEvent::Error { .. } => {}
            }
        }
    });
    (tx, handle)
}

/// List unfulfilled orders without going through the model.
async fn cmd_orders(limit: u32, search: Option<String>) {
    let mut executor = ToolExecutor::new(
        Arc::new(MockShippingProvider::new()),
        Arc::new(OrderBook::demo()),
        Config::get().customer_context(),
    );

    let mut input = serde_json::json!({ "limit": limit });
    if let Some(search) = search {
        input["search"] = serde_json::Value::String(search);
    }

    let output = executor.execute("get_unfulfilled_orders", input).await;
    println!("{}", output);
}

/// Show the resolved configuration as JSON, with the API key masked.
fn cmd_config(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if shown.provider.api_key.is_some() {
        shown.provider.api_key = Some("***".to_string());
    }
    println!("Config file: {:?}", Config::path());
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}
