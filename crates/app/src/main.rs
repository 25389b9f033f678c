use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use services::{AppServices, Clock, ConfigOverrides, QuizConfig};
use tracing_subscriber::EnvFilter;

mod command;
mod play;
mod terminal;

const DEFAULT_LOG_FILTER: &str = "kviz=info,services=info,storage=info";

/// Guess today's songs from ever longer previews.
#[derive(Debug, Parser)]
#[command(name = "kviz", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// TOML configuration file.
    #[arg(long, global = true, env = "KVIZ_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database URL or path.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Base URL of the today-tracks/search service.
    #[arg(long, global = true)]
    provider_url: Option<String>,

    /// Weekly schedule file; switches tracks to Deezer lookups.
    #[arg(long, global = true)]
    schedule: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Play today's quiz (default).
    Play,
    /// Forget stored progress.
    Reset,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            database_url: self.db.clone().map(normalize_sqlite_url),
            provider_url: self.provider_url.clone(),
            schedule_path: self.schedule.clone(),
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("sqlite:") {
        return trimmed.to_string();
    }
    let path = std::path::Path::new(trimmed);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}?mode=rwc", absolute.display())
}

/// Create the parent directory of a file-backed database.
fn prepare_sqlite_dir(db_url: &str) -> Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = QuizConfig::load(&cli.overrides()).context("loading configuration")?;
    prepare_sqlite_dir(&config.database_url)?;

    let services = AppServices::from_config(config, Clock::default_clock())
        .await
        .context("starting services")?;

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => play::run(&services).await,
        Command::Reset => {
            services
                .quiz_loop()
                .reset()
                .await
                .context("clearing progress")?;
            println!("Napredak je obrisan.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "kviz starting");
    if let Err(err) = run(cli).await {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_become_sqlite_urls() {
        let url = normalize_sqlite_url("/tmp/kviz/progress.db".into());
        assert_eq!(url, "sqlite:///tmp/kviz/progress.db?mode=rwc");
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }

    #[test]
    fn subcommand_defaults_to_play() {
        let cli = Cli::parse_from(["kviz", "--db", "sqlite::memory:"]);
        assert_eq!(cli.command, None);
        assert_eq!(cli.overrides().database_url.as_deref(), Some("sqlite::memory:"));

        let cli = Cli::parse_from(["kviz", "reset", "--provider-url", "http://localhost:3000/api"]);
        assert_eq!(cli.command, Some(Command::Reset));
        assert_eq!(
            cli.overrides().provider_url.as_deref(),
            Some("http://localhost:3000/api")
        );
    }
}
