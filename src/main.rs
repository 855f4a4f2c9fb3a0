use clap::{Parser, Subcommand};
use gmv_batch::cli::run::{RunError, RunOptions};
use gmv_batch::config::generate::Preset;
use gmv_batch::config::resolve_config_path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gmv-batch")]
#[command(about = "Batch ground motion visualizations for catalog earthquakes", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the events and output filenames without rendering anything
    #[arg(short = 'r', long, global = true)]
    report_only: bool,

    /// Resolve selections and names for every event but skip the renderer
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Run,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long, value_enum, default_value_t = Preset::Global)]
        preset: Preset,

        #[arg(long)]
        stdout: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gmv_batch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run) | None => {
            let options = RunOptions {
                report_only: cli.report_only,
                dry_run: cli.dry_run,
            };
            let config_path = resolve_config_path(cli.config.as_deref());

            match gmv_batch::cli::run::run(config_path, options).await {
                Ok(summary) if summary.has_failures() => ExitCode::from(1),
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => fatal(e),
            }
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { preset, stdout } => match gmv_batch::cli::config::init(stdout, preset) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from(2)
                }
            },
        },
    }
}

fn fatal(e: RunError) -> ExitCode {
    error!(error = %e, "Run aborted");
    eprintln!("Error: {}", e);
    ExitCode::from(2)
}
