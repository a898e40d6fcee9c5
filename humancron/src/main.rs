use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use humancron::app::App;
use humancron::command::ShellCommandRunner;
use humancron::config::Config;
use humancron::history::{format_last_run, HistoryStore, SharedHistory};
use humancron::links::SystemLinkOpener;
use humancron::loader;
use humancron::session::Session;
use humancron::ui::{format_duration, ui};
use humancron_sdk::{log_file_saved, log_found, log_info, log_warning, CommandRunner};

/// Run personal routines one step at a time
#[derive(Parser, Debug)]
#[command(name = "humancron", version, about)]
struct Cli {
    /// Workflows directory (overrides HUMANCRON_WORKFLOWS_DIR)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive selector and execution view (default)
    Tui,
    /// List loaded workflows and any files that failed to load
    List,
    /// Check workflow files and report errors
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Run one step's command and print the result
    RunCommand {
        file: PathBuf,
        /// Step name or 1-based step number
        step: String,
    },
    /// Create a new workflow file from the template
    New { name: String },
    /// Show recorded runs
    History,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.dir)?;

    let command = cli.command.unwrap_or(Command::Tui);
    let log_file = matches!(command, Command::Tui).then(|| config.log_path());
    init_logging(log_file.as_deref())?;

    match command {
        Command::Tui => run_tui(config),
        Command::List => list(&config),
        Command::Validate { files } => validate(&files),
        Command::RunCommand { file, step } => run_command(&config, &file, &step),
        Command::New { name } => new_workflow(&config, &name),
        Command::History => history(&config),
    }
}

/// Logs go to stderr, or to `log_file` while the TUI owns the terminal
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_env("HUMANCRON_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow!(e))
        }
        None => builder
            .with_writer(io::stderr)
            .try_init()
            .map_err(|e| anyhow!(e)),
    }
}

fn run_tui(config: Config) -> Result<()> {
    loader::ensure_directory(&config.workflows_dir)?;
    let report = loader::load_directory(&config.workflows_dir)?;
    let skipped = report.skipped.iter().map(|e| e.to_string()).collect();

    let history = SharedHistory::new(HistoryStore::open(config.history_path()));
    let session = Session::new(
        report.workflows,
        Box::new(history.clone()),
        Arc::new(ShellCommandRunner::new(&config.workflows_dir)),
        Box::new(SystemLinkOpener),
    );
    let mut app = App::new(config, session, history, skipped)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.tick();

        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn list(config: &Config) -> Result<()> {
    log_info!("Loading workflows from {}", config.workflows_dir.display());
    let report = loader::load_directory(&config.workflows_dir)?;
    log_found!(report.workflows.len(), "workflows");

    for workflow in &report.workflows {
        let duration = workflow
            .total_duration()
            .map(|d| format!(", ~{}", format_duration(d)))
            .unwrap_or_default();
        println!(
            "  {} ({} steps{})",
            workflow.name,
            workflow.declared_step_count(),
            duration
        );
        println!("      {}", workflow.description);
    }

    for skipped in &report.skipped {
        log_warning!("Skipped {}", skipped);
    }
    Ok(())
}

fn validate(files: &[PathBuf]) -> Result<()> {
    let mut failures = 0;
    for file in files {
        match loader::load_file(file) {
            Ok(workflow) => println!(
                "\x1b[32m✓ {}: '{}' ({} steps)\x1b[0m",
                file.display(),
                workflow.name,
                workflow.declared_step_count()
            ),
            Err(e) => {
                failures += 1;
                println!("\x1b[31m✗ {}\x1b[0m", e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} file(s) failed validation", failures, files.len());
    }
    Ok(())
}

fn run_command(config: &Config, file: &Path, step: &str) -> Result<()> {
    let workflow = loader::load_file(file)?;
    let target = match step.parse::<usize>() {
        Ok(n) if n >= 1 => workflow.steps.get(n - 1),
        _ => workflow.steps.iter().find(|s| s.name == step),
    }
    .ok_or_else(|| anyhow!("No step '{}' in '{}'", step, workflow.name))?;

    let Some(command) = &target.command else {
        bail!("Step '{}' has no command", target.name);
    };

    log_info!("Running: {}", command);
    let runner = ShellCommandRunner::new(&config.workflows_dir);
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(runner.execute(
        command,
        &workflow.name,
        &target.name,
        &HashMap::new(),
    ));

    println!("{}", result.combined_output());
    println!();
    if result.is_success() {
        println!(
            "\x1b[32m✓ {} ({})\x1b[0m",
            result.display_summary(),
            result.duration_string()
        );
        Ok(())
    } else {
        bail!("{} ({})", result.display_summary(), result.duration_string())
    }
}

fn new_workflow(config: &Config, name: &str) -> Result<()> {
    let path = loader::create_workflow_file(&config.workflows_dir, name)?;
    log_file_saved!(path.display());
    Ok(())
}

fn history(config: &Config) -> Result<()> {
    let store = HistoryStore::open(config.history_path());
    let runs = store.runs();
    log_found!(runs.len(), "recorded runs");

    let now = chrono::Local::now();
    for run in runs {
        let status = match run.completed_at {
            Some(_) => format!("completed {}/{} steps", run.steps_completed, run.total_steps),
            None => "not finished".to_string(),
        };
        println!(
            "  {:<30} {:<12} {}",
            run.workflow_name,
            format_last_run(run.started_at, now),
            status
        );
    }
    Ok(())
}
