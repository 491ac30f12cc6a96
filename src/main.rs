use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use uidsl::config::{self as cfg, RunnerConfig};
use uidsl::dsl;
use uidsl::executor::{StepExecutor, SuiteResult, SuiteRunner, TestSession};
use uidsl::report::{Reporter, StdoutSink};
use uidsl::sources::{self, PayloadQueue, QueueMode, QueueServerConfig};
use uidsl::surface::{AppBootstrap, SnapshotBootstrap};

/// uidsl CLI
#[derive(Debug, Parser)]
#[command(
    name = uidsl::PKG_NAME,
    version = uidsl::PKG_VERSION,
    about = "Declarative step-DSL runner for UI test suites"
)]
struct Cli {
    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Launch the app, run a suite, then optionally poll for interactive suites
    Run(RunArgs),
    /// Serve queued DSL payloads to an interactive session
    Serve(ServeArgs),
    /// Print a JSON Schema and exit
    Schema {
        #[arg(value_enum)]
        which: SchemaKind,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaKind {
    Config,
    Suite,
}

#[derive(Debug, ClapArgs)]
struct RunArgs {
    /// JSON element tree describing the application under test
    #[arg(long = "app")]
    app: PathBuf,

    /// Suite document (YAML or JSON)
    #[arg(short = 's', long = "suite")]
    suite: Option<PathBuf>,

    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Poll a coordinator for suites after the static suite
    #[arg(long = "interactive")]
    interactive: bool,

    #[arg(long = "server-url")]
    server_url: Option<String>,

    #[arg(long = "exit-command")]
    exit_command: Option<String>,

    #[arg(long = "poll-interval-ms")]
    poll_interval_ms: Option<u64>,
}

#[derive(Debug, ClapArgs)]
struct ServeArgs {
    /// DSL files to queue at startup, in order
    files: Vec<PathBuf>,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 9000)]
    port: u16,

    /// Path the interactive session polls
    #[arg(long, default_value = "/next")]
    endpoint: String,

    /// Send the exit command once the queue is drained
    #[arg(long, conflicts_with = "cycle")]
    exit: bool,

    #[arg(long = "exit-command", default_value = "exit")]
    exit_command: String,

    /// Re-queue served payloads so they repeat
    #[arg(long)]
    cycle: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.log_level.as_deref() {
        Some(raw) => {
            let level = uidsl::parse_level(raw).unwrap_or(tracing::Level::INFO);
            uidsl::init_tracing_with_level(level);
        }
        None => uidsl::init_tracing(),
    }

    match cli.command {
        Command::Schema { which } => {
            let schema = match which {
                SchemaKind::Config => cfg::generate_schema(),
                SchemaKind::Suite => dsl::generate_suite_schema(),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Serve(args) => serve(args).await,
        Command::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    info!(version = uidsl::PKG_VERSION, app = %args.app.display(), "Starting uidsl");

    let mut config = match &args.config {
        Some(path) => cfg::load_from_path_async(path).await?,
        None => RunnerConfig::default(),
    };
    apply_overrides(&mut config, &args);
    cfg::validate_config(&config)?;
    debug!(target: "uidsl", "Configuration ready");

    let surface = SnapshotBootstrap::new(&args.app).launch().await?;
    let mut runner = SuiteRunner::new(
        StepExecutor::new(surface, &config),
        Reporter::new(Arc::new(StdoutSink)),
    );
    let mut session = TestSession::new();
    let mut total = SuiteResult::default();

    if let Some(path) = &args.suite {
        let suite = dsl::load_suite_from_path_async(path).await?;
        total.merge(runner.run(&suite, &mut session).await);
        runner.settle().await;
    } else if !config.interactive.enabled {
        warn!("No suite given and interactive mode is off; nothing to run");
    }

    if config.interactive.enabled {
        tokio::select! {
            result = sources::run_interactive(&config.interactive, &mut runner, &mut session) => {
                total.merge(result);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping interactive session");
            }
        }
    }

    report_totals(runner.reporter(), &total);
    info!(passed = total.passed, failed = total.failed, "uidsl finished");
    Ok(if total.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn apply_overrides(config: &mut RunnerConfig, args: &RunArgs) {
    let interactive = &mut config.interactive;
    if args.interactive {
        interactive.enabled = true;
    }
    if let Some(url) = &args.server_url {
        interactive.server_url = Some(url.clone());
    }
    if let Some(exit) = &args.exit_command {
        interactive.exit_command = exit.clone();
    }
    if let Some(ms) = args.poll_interval_ms {
        interactive.poll_interval_ms = ms;
    }
}

fn report_totals(reporter: &Reporter, total: &SuiteResult) {
    if total.failed_tests.is_empty() {
        return;
    }
    reporter.line("Failed tests:");
    for description in &total.failed_tests {
        reporter.line(&format!("  - {description}"));
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<ExitCode> {
    let queue = PayloadQueue::from_files(&args.files).await?;
    let mode = if args.exit {
        QueueMode::ExitWhenEmpty
    } else if args.cycle {
        QueueMode::Cycle
    } else {
        QueueMode::Drain
    };
    let config = QueueServerConfig {
        endpoint: args.endpoint,
        mode,
        exit_command: args.exit_command,
    };
    let endpoint = config.normalized_endpoint();

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    let addr = listener.local_addr()?;
    info!(queued = queue.len(), ?mode, "Queue server ready");
    println!("Queue server running at http://{addr}/");
    println!("Interactive sessions should poll http://{addr}{endpoint}");

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            on_signal.cancel();
        }
    });

    sources::queue_server::serve(listener, sources::queue_server::router(queue, config), shutdown)
        .await?;
    Ok(ExitCode::SUCCESS)
}
