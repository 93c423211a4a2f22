//! Interactive negotiation REPL
//!
//! The user types as the seller; every line goes to the buyer agent unless
//! it is an exit word or a slash command.

use anyhow::Result;
use buyer_core::config::require_api_key;
use buyer_core::{OpenAiClient, PurchaseOutcome, Session};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::commands::{print_catalog, resolve_config};
use crate::transcript::{new_id, InputHistory, Transcript, TranscriptStore};
use crate::ChatArgs;

// ANSI colors
const GREEN: &str = "\x1b[92m";
const BLUE: &str = "\x1b[94m";
const YELLOW: &str = "\x1b[93m";
const CYAN: &str = "\x1b[96m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// REPL state
struct ReplState {
    session: Session,
    store: TranscriptStore,
    transcript_id: String,
    started_at: DateTime<Utc>,
    save_on_exit: bool,
}

impl ReplState {
    async fn new(config_path: Option<&Path>, args: ChatArgs) -> Result<Self> {
        let api_key = require_api_key(args.api_key.as_deref())?;

        let (mut config, source) = resolve_config(config_path)?;
        if source.is_none() {
            eprintln!(
                "{}Warning:{} buyer.toml not found, using defaults",
                YELLOW, RESET
            );
        }

        // CLI flags override the config file
        if let Some(model) = args.model {
            config.model.name = model;
        }
        if let Some(base_url) = args.base_url {
            config.model.base_url = base_url;
        }
        if let Some(budget) = args.budget {
            config.market.budget = budget;
        }
        if args.seed.is_some() {
            config.market.seed = args.seed;
        }

        let client = OpenAiClient::new(
            config.model.base_url.clone(),
            api_key,
            config.model.name.clone(),
            Duration::from_secs(config.model.timeout_secs),
        )?
        .with_temperature(config.model.temperature)
        .with_max_tokens(config.model.max_tokens);

        if !client.health_check().await {
            warn!(base_url = %config.model.base_url, "model_api_unreachable");
            eprintln!(
                "{}Warning:{} {} did not accept the API key or is unreachable",
                YELLOW, RESET, config.model.base_url
            );
        }

        let session = Session::new(&config, Box::new(client))?;

        Ok(Self {
            session,
            store: TranscriptStore::new()?,
            transcript_id: new_id(),
            started_at: Utc::now(),
            save_on_exit: args.save,
        })
    }

    fn save(&self) -> Result<()> {
        let transcript = Transcript::capture(&self.transcript_id, self.started_at, &self.session);
        let path = self.store.save(&transcript)?;
        println!("{}Saved:{} {}", GREEN, RESET, path.display());
        Ok(())
    }
}

/// Run the interactive REPL
pub async fn run(config_path: Option<&Path>, args: ChatArgs) -> Result<()> {
    let mut state = ReplState::new(config_path, args).await?;

    // Setup readline
    let history = InputHistory::new()?;
    let mut rl: Editor<(), DefaultHistory> = DefaultEditor::new()?;
    let _ = rl.load_history(history.path());

    print_welcome(&state);

    loop {
        let prompt = format!("{}Seller:{} ", CYAN, RESET);

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if Session::is_exit(line) {
                    state.session.close(line);
                    println!("Conversation ended.");
                    break;
                }

                if line.starts_with('/') {
                    match handle_slash_command(&mut state, line) {
                        Ok(true) => break,
                        Ok(false) => continue,
                        Err(e) => {
                            eprintln!("{}Error:{} {:#}", YELLOW, RESET, e);
                            continue;
                        }
                    }
                }

                if let Err(e) = negotiate(&mut state, line).await {
                    eprintln!("{}Error:{} {:#}", YELLOW, RESET, e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}^C{}", DIM, RESET);
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Conversation ended.");
                break;
            }
            Err(e) => {
                eprintln!("{}Error:{} {}", YELLOW, RESET, e);
                break;
            }
        }
    }

    let _ = rl.save_history(history.path());

    if state.save_on_exit {
        state.save()?;
    }

    Ok(())
}

fn print_welcome(state: &ReplState) {
    let session = &state.session;
    println!();
    println!(
        "{}buyer{} - negotiating with {}{}{} ({}{}{})",
        BOLD,
        RESET,
        BOLD,
        session.agent_name(),
        RESET,
        BLUE,
        session.model_name(),
        RESET
    );
    println!(
        "Budget: {}  |  Type {}exit{} to finish, {}/help{} for commands",
        session.ledger().balance(),
        CYAN,
        RESET,
        CYAN,
        RESET
    );
    println!();
}

/// Send one seller line to the buyer and print the result
async fn negotiate(state: &mut ReplState, line: &str) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("{} is thinking...", state.session.agent_name()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = state.session.turn(line).await;
    spinner.finish_and_clear();
    let report = result?;

    println!(
        "{}{}:{} {}",
        GREEN,
        state.session.agent_name(),
        RESET,
        report.reply
    );

    match &report.outcome {
        PurchaseOutcome::Purchased { .. } => println!("{}✓ {}{}", GREEN, report.outcome, RESET),
        PurchaseOutcome::InsufficientBudget { .. } => {
            println!("{}✗ {}{}", YELLOW, report.outcome, RESET)
        }
        PurchaseOutcome::NoIntent => {}
    }

    println!();
    print_history(&state.session);
    println!();

    Ok(())
}

fn print_history(session: &Session) {
    println!("{}Chat History:{}", BOLD, RESET);
    for message in session.history() {
        println!("{}", message);
    }
}

/// Handle slash commands. Returns true when the REPL should exit.
fn handle_slash_command(state: &mut ReplState, input: &str) -> Result<bool> {
    let cmd = input
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => {
            print_help();
            Ok(false)
        }
        "/exit" | "/quit" | "/q" => {
            println!("Conversation ended.");
            Ok(true)
        }
        "/budget" => {
            let ledger = state.session.ledger();
            println!(
                "Budget: {} of {} remaining",
                ledger.balance(),
                state.session.starting_budget()
            );
            Ok(false)
        }
        "/assets" => {
            print_catalog(state.session.catalog(), state.session.ledger().balance());
            Ok(false)
        }
        "/history" | "/hist" => {
            if state.session.history().is_empty() {
                println!("No messages yet");
            } else {
                print_history(&state.session);
            }
            Ok(false)
        }
        "/memory" | "/mem" => {
            println!(
                "{}Memories ({}):{}",
                BOLD,
                state.session.memory().len(),
                RESET
            );
            for entry in state.session.memory().retrieve_recent(usize::MAX, true) {
                println!("  {}", entry.replace('\n', "\n  "));
            }
            Ok(false)
        }
        "/purchases" => {
            let purchases = state.session.purchases();
            if purchases.is_empty() {
                println!("No purchases yet");
            } else {
                println!("{}Purchases:{}", BOLD, RESET);
                for p in purchases {
                    println!(
                        "  {} {}for {}{} {}({}){}",
                        p.asset,
                        DIM,
                        RESET,
                        p.price,
                        DIM,
                        p.timestamp.format("%d %b %Y %H:%M"),
                        RESET
                    );
                }
            }
            Ok(false)
        }
        "/save" => {
            state.save()?;
            Ok(false)
        }
        _ => {
            println!("{}Unknown command:{} {}", YELLOW, RESET, cmd);
            println!("Type {}/help{} for available commands", CYAN, RESET);
            Ok(false)
        }
    }
}

fn print_help() {
    println!();
    println!("{}Commands:{}", BOLD, RESET);
    println!("  {}/help{}, /h, /?      Show this help", CYAN, RESET);
    println!("  {}/budget{}           Show remaining budget", CYAN, RESET);
    println!("  {}/assets{}           Show assets with current prices", CYAN, RESET);
    println!("  {}/history{}          Show the chat history", CYAN, RESET);
    println!("  {}/memory{}           Show the buyer's memories", CYAN, RESET);
    println!("  {}/purchases{}        Show completed purchases", CYAN, RESET);
    println!("  {}/save{}             Save a transcript", CYAN, RESET);
    println!("  {}/exit{}, /quit, /q  Exit the REPL", CYAN, RESET);
    println!();
    println!("{}Tips:{}", DIM, RESET);
    println!("  - Typing exit, quit or bye ends the conversation");
    println!("  - Press Ctrl+D to exit");
    println!();
}
