use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use redraft::cli::Cli;
use redraft::cli::commands::{Commands, SessionCommands};
use redraft::config::GlobalConfig;
use redraft::domain::StopReason;
use redraft::generate::LlmGenerator;
use redraft::hooks::{HookChain, LoggingHook};
use redraft::llm::{HttpClientConfig, HttpGenerationClient};
use redraft::metrics::{default_probes, gather, synthesize_report};
use redraft::review::{HumanReviewer, Reviewer, RuleReviewer};
use redraft::runner::{LoopController, RefineConfig};
use redraft::session::{SessionState, SessionStore, SqliteSessionStore};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redraft")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("redraft.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_generator(config: &GlobalConfig, task: &str) -> Result<LlmGenerator> {
    let client_config = HttpClientConfig {
        model: config.llm.model.clone(),
        timeout: Duration::from_millis(config.llm.timeout_ms),
        ..Default::default()
    };
    let client = HttpGenerationClient::new(client_config)
        .context("Failed to create generation client (is REDRAFT_API_KEY set?)")?;
    Ok(LlmGenerator::new(Arc::new(client), task).with_max_tokens(config.llm.max_tokens))
}

fn refine_config(config: &GlobalConfig, override_budget: Option<u32>) -> RefineConfig {
    RefineConfig::new(override_budget.unwrap_or(config.refine.max_iterations))
}

fn print_report(report: &redraft::domain::LoopReport) {
    println!();
    match report.reason {
        StopReason::Converged => println!("{}", "Draft accepted by the reviewer.".green()),
        StopReason::ExternalApproval => println!("{}", "Draft approved by the operator.".green()),
        StopReason::BudgetExhausted => println!(
            "{}",
            "Iteration budget exhausted; criteria not fully met. Best draft so far:".yellow()
        ),
        StopReason::Errored => println!("{}", "Generation failed; last good draft:".red()),
    }
    println!("\n{}\n", report.artifact);
    println!(
        "{} {} cycle(s), terminal verdict: {}",
        "Done:".cyan(),
        report.cycles,
        report.verdict
    );
    if let Some(error) = &report.error {
        println!("{} {}", "Error:".red(), error);
    }
}

async fn run_loop<R>(
    config: &GlobalConfig,
    task: &str,
    budget: Option<u32>,
    reviewer: Arc<R>,
) -> Result<()>
where
    R: Reviewer + 'static,
{
    let generator = Arc::new(build_generator(config, task)?);
    let controller = LoopController::new(generator, reviewer)
        .with_config(refine_config(config, budget))
        .with_hooks(HookChain::new().with_hook(LoggingHook));

    let store = SqliteSessionStore::open(&config.db_path()).context("Failed to open session store")?;
    let mut state = SessionState::new();
    store.create(&state).context("Failed to create session")?;
    println!("{} {}", "Session:".cyan(), state.id);

    let report = controller.run(&mut state).await.context("Refine loop failed")?;

    store.save(&state).context("Failed to save session")?;
    print_report(&report);
    Ok(())
}

async fn handle_draft(config: &GlobalConfig, task: &str, budget: Option<u32>) -> Result<()> {
    info!("Starting automated draft loop for task: {}", task);
    let reviewer = Arc::new(
        RuleReviewer::new(config.criteria.clone()).context("Invalid acceptance criteria")?,
    );
    run_loop(config, task, budget, reviewer).await
}

async fn handle_review(config: &GlobalConfig, task: &str, budget: Option<u32>) -> Result<()> {
    info!("Starting human-in-the-loop draft loop for task: {}", task);
    println!(
        "{}",
        "Each cycle you will see the draft; type 'approve' (or 'a') to accept it, or feedback to revise.".cyan()
    );
    run_loop(config, task, budget, Arc::new(HumanReviewer::stdin())).await
}

async fn handle_metrics() -> Result<()> {
    info!("Gathering system metrics");
    let mut state = SessionState::new();
    gather(&mut state, &default_probes())
        .await
        .context("Metric gather failed")?;
    println!("{}", synthesize_report(&state));
    Ok(())
}

fn handle_sessions(config: &GlobalConfig, command: &SessionCommands) -> Result<()> {
    let store = SqliteSessionStore::open(&config.db_path()).context("Failed to open session store")?;
    match command {
        SessionCommands::List => {
            let ids = store.list().context("Failed to list sessions")?;
            if ids.is_empty() {
                println!("{}", "No stored sessions.".yellow());
            }
            for id in ids {
                println!("{}", id);
            }
        }
        SessionCommands::Show { id } => match store.get(id).context("Failed to load session")? {
            Some(state) => {
                println!("{} {}", "Session:".cyan(), state.id);
                println!("{} {}", "Verdict:".cyan(), state.verdict);
                println!("{} {}", "Iterations:".cyan(), state.iteration_count);
                if !state.feedback.is_empty() {
                    println!("{} {}", "Feedback:".cyan(), state.feedback);
                }
                println!("\n{}", state.artifact);
            }
            None => println!("{} {}", "No such session:".red(), id),
        },
        SessionCommands::Delete { id } => {
            store.delete(id).context("Failed to delete session")?;
            println!("{} {}", "Deleted session".green(), id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();
    let config = redraft::config::load_config(cli.config.as_ref())?;
    config.validate()?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Draft { task, max_iterations } => handle_draft(&config, task, *max_iterations).await,
        Commands::Review { task, max_iterations } => handle_review(&config, task, *max_iterations).await,
        Commands::Metrics => handle_metrics().await,
        Commands::Sessions { command } => handle_sessions(&config, command),
    }
}
