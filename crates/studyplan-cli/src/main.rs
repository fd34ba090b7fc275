mod config;
mod generate_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use studyplan_core::generation::ChatCompletionsClient;
use studyplan_core::plan::{DEFAULT_DURATION_DAYS, PlanOrchestrator};

use config::{CliOverrides, StudyPlanConfig};

#[derive(Parser)]
#[command(
    name = "studyplan",
    about = "Turn a syllabus and learning preferences into a study plan"
)]
struct Cli {
    /// Config file (defaults to ~/.config/studyplan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides STUDYPLAN_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Model name (overrides STUDYPLAN_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
    /// Generate one plan and print its summary
    Generate {
        /// Syllabus text file, or `-` to read stdin
        #[arg(long)]
        syllabus: PathBuf,
        /// Free-text learning preferences
        #[arg(long)]
        preferences: String,
        /// Study duration in days
        #[arg(long, default_value_t = DEFAULT_DURATION_DAYS)]
        days: u32,
        /// Write the full plan as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write the plan as PDF to this file
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// Model name (overrides STUDYPLAN_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
}

/// Execute `studyplan init`: write a default config file.
fn cmd_init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile::default();
    config::save_config(path, &cfg)?;

    println!("Config written to {}", path.display());
    println!("  server = {}:{}", cfg.server.bind, cfg.server.port);
    println!("  llm.base_url = {}", cfg.llm.base_url);
    println!("  llm.model = {}", cfg.llm.model);
    println!();
    println!(
        "Next: export {} (or set llm.api_key) and run `studyplan serve`.",
        cfg.llm.api_key_env
    );

    Ok(())
}

fn build_orchestrator(resolved: &StudyPlanConfig) -> anyhow::Result<PlanOrchestrator> {
    let client = ChatCompletionsClient::new(resolved.llm.clone())?;
    Ok(PlanOrchestrator::new(Arc::new(client)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::config_path);
            cmd_init(&path, force)?;
        }
        Commands::Serve { bind, port, model } => {
            let overrides = CliOverrides {
                bind: bind.as_deref(),
                port,
                model: model.as_deref(),
            };
            let resolved = StudyPlanConfig::resolve(cli.config.as_deref(), &overrides)?;
            let orchestrator = build_orchestrator(&resolved)?;
            let state = serve_cmd::AppState::new(orchestrator);
            serve_cmd::run_serve(state, &resolved.bind, resolved.port).await?;
        }
        Commands::Generate {
            syllabus,
            preferences,
            days,
            output,
            pdf,
            model,
        } => {
            let overrides = CliOverrides {
                model: model.as_deref(),
                ..CliOverrides::default()
            };
            let resolved = StudyPlanConfig::resolve(cli.config.as_deref(), &overrides)?;
            let orchestrator = build_orchestrator(&resolved)?;
            let options = generate_cmd::GenerateOptions {
                syllabus,
                preferences,
                days,
                output,
                pdf,
            };
            generate_cmd::run_generate(&orchestrator, &options).await?;
        }
    }

    Ok(())
}
