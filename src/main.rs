//! Study Buddy - interactive shell
//!
//! Reads requests line by line, runs them through the conversation engine
//! and prints the result. Works offline; the remote interpreter is only
//! consulted for requests the classifier cannot place.

use clap::Parser;
use study_buddy::command::{ActionResult, AppState, InMemoryAppState};
use study_buddy::core::calendar::{describe_date, SystemClock};
use study_buddy::core::config::AssistantConfig;
use study_buddy::core::error::Result;
use study_buddy::llm::client::{ChatClient, Interpreter};
use study_buddy::session::{ConversationEngine, Interpretation};

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "study-buddy")]
#[command(about = "Plan tasks and study sessions in plain language")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Conversation session id
    #[arg(long, default_value = "default")]
    session: String,

    /// Interpretation service base URL (overrides config and environment)
    #[arg(long)]
    api_url: Option<String>,

    /// Never contact the interpretation service
    #[arg(long)]
    offline: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "study_buddy=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AssistantConfig::load(path)?,
        None => AssistantConfig::new(),
    }
    .with_env();
    if let Some(url) = args.api_url {
        config.interpreter.url = url;
    }
    if args.offline {
        config.interpreter.enabled = false;
    }
    config.validate()?;

    let rt = Runtime::new()?;

    let client = if config.interpreter.enabled {
        match ChatClient::new(&config.interpreter) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "interpreter unavailable - running offline");
                None
            }
        }
    } else {
        None
    };

    let mut engine =
        ConversationEngine::from_config(&config, InMemoryAppState::new(), Arc::new(SystemClock));
    if let Some(client) = &client {
        engine = engine.with_interpreter(client.clone() as Arc<dyn Interpreter>);
    }

    println!("\n=== STUDY BUDDY ===");
    println!("Tell me what you need to get done.");
    println!();
    println!("Commands:");
    println!("  :tasks     - List tasks");
    println!("  :history   - Show executed commands");
    println!("  :health    - Check the interpretation service");
    println!("  :reset     - Forget pending questions");
    println!("  :quit      - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            ":quit" | ":q" => break,
            ":tasks" => print_tasks(engine.state()),
            ":history" => {
                for entry in engine.history().entries() {
                    println!(
                        "  [{}] {} -> {:?}",
                        entry.timestamp.format("%H:%M"),
                        entry.raw_text,
                        entry.result.status
                    );
                }
            }
            ":health" => match &client {
                Some(client) => match rt.block_on(client.health()) {
                    Ok(status) => println!("  {}", status),
                    Err(e) => println!("  unavailable: {}", e),
                },
                None => println!("  running offline"),
            },
            ":reset" => {
                rt.block_on(engine.clear_conversation(&args.session));
                println!("  Conversation cleared.");
            }
            text => {
                let outcome = rt.block_on(engine.interpret(text, &args.session));
                report(&mut engine, &outcome);
            }
        }
    }

    tracing::info!("Goodbye");
    Ok(())
}

fn report(engine: &mut ConversationEngine<InMemoryAppState>, outcome: &Interpretation) {
    if let Some(result) = &outcome.result {
        print_result(result);
        for transition in &result.transitions {
            if let Err(e) = engine.state_mut().apply(transition) {
                tracing::warn!(error = %e, "could not apply UI transition");
            }
        }
    } else if outcome.is_awaiting_follow_up() {
        for question in &outcome.questions {
            println!("  {}", question);
        }
    } else if let Some(error) = &outcome.command.error {
        println!("  {}", error);
    }
}

fn print_result(result: &ActionResult) {
    println!("  {}", result.message);
    if let Some(serde_json::Value::Array(examples)) = result.data.get("examples") {
        for example in examples.iter().filter_map(|e| e.as_str()) {
            println!("    - {}", example);
        }
    }
}

fn print_tasks(state: &InMemoryAppState) {
    let tasks = state.tasks();
    if tasks.is_empty() {
        println!("  No tasks yet.");
        return;
    }
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        println!(
            "  [{}] {} - due {} ({} priority)",
            mark,
            task.name,
            describe_date(task.due_date),
            task.priority
        );
    }
}
