//! Move Playground CLI
//!
//! Command-line interface for running Move code in the sandbox, scoring
//! checkpoint submissions and managing the database.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use move_playground::config::{
    config_path, validate_config, Config, LogConfig, LogFormat, StorageBackendType,
};
use move_playground::core::{Checkpoint, CheckpointStore};
use move_playground::database::{init_pool, migrations, InMemoryCheckpointStore, PgCheckpointStore};
use move_playground::sandbox::{RunOutcome, SandboxRunner};
use move_playground::verification::VerificationEngine;
use move_playground::VERSION;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "move-playground",
    author = "Move Playground Contributors",
    version = VERSION,
    about = "Move Playground - Sandboxed Move execution and checkpoint verification",
    long_about = None
)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Move source file
    Compile {
        /// Path to the Move source
        file: PathBuf,
    },

    /// Run the unit tests of a Move source file
    Test {
        /// Path to the Move source
        file: PathBuf,
    },

    /// Run toolchain command lines against a Move source file
    Interact {
        /// Path to the Move source
        file: PathBuf,
        /// Command line to run, in order (repeatable)
        #[arg(long = "command", short = 'c', required = true)]
        commands: Vec<String>,
    },

    /// Score a submission against a checkpoint
    Submit {
        /// User submitting the answer
        #[arg(long, env = "MOVE_PLAYGROUND_USER")]
        user: String,
        /// Checkpoint ID
        #[arg(long)]
        checkpoint: String,
        /// Load checkpoints from this JSON file instead of the database
        #[arg(long)]
        checkpoints_file: Option<PathBuf>,
        /// File holding the answer or Move source
        file: PathBuf,
    },

    /// Import checkpoints from a JSON file into the database
    Import {
        /// JSON array of checkpoints
        file: PathBuf,
    },

    /// Run database migrations
    Migrate,

    /// Check the toolchain and configuration
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    init_logging(&config.log);
    debug!("Loaded configuration from {}", config_path().display());

    match cli.command {
        Commands::Compile { file } => {
            let source = read_source(&file)?;
            let outcome = SandboxRunner::new(&config.sandbox).compile(&source).await;
            report_outcome(&outcome, cli.json)
        }
        Commands::Test { file } => {
            let source = read_source(&file)?;
            let outcome = SandboxRunner::new(&config.sandbox).run_tests(&source).await;
            report_outcome(&outcome, cli.json)
        }
        Commands::Interact { file, commands } => {
            let source = read_source(&file)?;
            let outcome = SandboxRunner::new(&config.sandbox).interact(&source, &commands).await;
            report_outcome(&outcome, cli.json)
        }
        Commands::Submit {
            user,
            checkpoint,
            checkpoints_file,
            file,
        } => submit(&config, &user, &checkpoint, checkpoints_file.as_deref(), &file, cli.json).await,
        Commands::Import { file } => import_checkpoints(&config, &file).await,
        Commands::Migrate => run_migrations(&config).await,
        Commands::Status => check_status(&config).await,
    }
}

// ============================================================================
// Setup
// ============================================================================

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_new(&log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn CheckpointStore>> {
    match config.storage.backend {
        StorageBackendType::Postgres => {
            let postgres = config
                .storage
                .postgres
                .as_ref()
                .context("PostgreSQL selected but not configured (set DATABASE_URL)")?;
            let pool = init_pool(postgres).await?;
            Ok(Arc::new(PgCheckpointStore::new(pool)))
        }
        StorageBackendType::Memory => {
            bail!("No database configured; set DATABASE_URL or pass --checkpoints-file")
        }
    }
}

fn load_checkpoints(path: &Path) -> anyhow::Result<Vec<Checkpoint>> {
    let content = read_source(path)?;
    serde_json::from_str(&content).with_context(|| format!("Invalid checkpoint file {}", path.display()))
}

// ============================================================================
// Commands
// ============================================================================

fn report_outcome(outcome: &RunOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else if outcome.success {
        println!("{}", outcome.output.as_deref().unwrap_or_default());
    } else {
        let failure = outcome.failure.map(|f| f.to_string()).unwrap_or_default();
        eprintln!("❌ Run failed ({}):\n{}", failure, outcome.error.as_deref().unwrap_or_default());
    }

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Score a submission and print the verdict
async fn submit(
    config: &Config,
    user: &str,
    checkpoint_id: &str,
    checkpoints_file: Option<&Path>,
    file: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let store: Arc<dyn CheckpointStore> = match checkpoints_file {
        Some(path) => Arc::new(InMemoryCheckpointStore::with_checkpoints(load_checkpoints(path)?)),
        None => open_store(config).await?,
    };
    let engine = VerificationEngine::new(SandboxRunner::new(&config.sandbox), store);

    let content = read_source(file)?;
    let verdict = engine.submit(user, checkpoint_id, &content).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        let mark = if verdict.is_correct { "✅ Correct" } else { "❌ Incorrect" };
        println!("{}", mark);
        println!("{}", verdict.message);
        if let Some(output) = &verdict.output {
            println!("\nOutput:\n{}", output);
        }
    }

    if !verdict.is_correct {
        std::process::exit(1);
    }
    Ok(())
}

/// Import checkpoints into the database
async fn import_checkpoints(config: &Config, file: &Path) -> anyhow::Result<()> {
    let checkpoints = load_checkpoints(file)?;
    let store = open_store(config).await?;

    for checkpoint in &checkpoints {
        store.save_checkpoint(checkpoint).await?;
        debug!(id = %checkpoint.id, chapter = %checkpoint.chapter_id, "Imported checkpoint");
    }

    println!("✅ Imported {} checkpoints into {}", checkpoints.len(), store.id());
    Ok(())
}

/// Run database migrations
async fn run_migrations(config: &Config) -> anyhow::Result<()> {
    println!("Running database migrations...\n");

    let postgres = config
        .storage
        .postgres
        .as_ref()
        .context("PostgreSQL not configured for migrations (set DATABASE_URL)")?;
    let pool = init_pool(postgres).await?;

    migrations::run(&pool).await?;

    println!("\n✅ Migrations complete!");
    Ok(())
}

/// Check the toolchain, configuration and database
async fn check_status(config: &Config) -> anyhow::Result<()> {
    println!("🔍 Move Playground Status\n");

    let validation = validate_config(config);
    if validation.valid {
        println!("Configuration: ✅ Valid");
    } else {
        println!("Configuration: ❌ Invalid");
    }
    for issue in &validation.errors {
        println!("  ❌ {}", issue);
    }
    for issue in &validation.warnings {
        println!("  ⚠️  {}", issue);
    }

    let toolchain = &config.sandbox.toolchain;
    match which::which(&toolchain.program) {
        Ok(path) => println!("Toolchain: ✅ {} ({})", toolchain.program, path.display()),
        Err(_) => println!("Toolchain: ❌ {} not found on PATH", toolchain.program),
    }

    let runner = SandboxRunner::new(&config.sandbox);
    if runner.toolchain_available().await {
        println!("Toolchain probe: ✅ OK");
    } else {
        println!("Toolchain probe: ❌ Failed\n  {}", toolchain.install_hint);
    }

    match runner.workspace_root() {
        Some(root) => println!("Workspaces: {}", root.display()),
        None => println!("Workspaces: {}", std::env::temp_dir().display()),
    }

    match config.storage.backend {
        StorageBackendType::Postgres => match open_store(config).await {
            Ok(store) => match store.health_check().await {
                Ok(_) => println!("PostgreSQL: ✅ Connected"),
                Err(e) => println!("PostgreSQL: ❌ {}", e),
            },
            Err(e) => println!("PostgreSQL: ❌ {}", e),
        },
        StorageBackendType::Memory => println!("Storage: in-memory (no database configured)"),
    }

    info!("Status check finished");
    Ok(())
}
