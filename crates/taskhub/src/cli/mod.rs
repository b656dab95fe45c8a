mod migrate;
mod run;

pub use migrate::MigrateCommand;
pub use run::RunCommand;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use taskhub_core::config::TaskHubConfig;

/// TaskHub - workspace and membership API
#[derive(Parser)]
#[command(name = "taskhub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server.
    Run(RunCommand),

    /// Manage database migrations.
    Migrate(MigrateCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(cmd) => cmd.execute().await,
            Commands::Migrate(cmd) => cmd.execute().await,
        }
    }
}

/// Load the config file, or fall back to `DATABASE_URL` when it is missing.
pub(crate) fn load_config(path: &str) -> Result<TaskHubConfig> {
    dotenvy::dotenv().ok();

    if Path::new(path).exists() {
        return TaskHubConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path));
    }

    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => Ok(TaskHubConfig::default_with_database_url(&url)),
        _ => anyhow::bail!(
            "Configuration file not found: {}\nCreate it or set DATABASE_URL.",
            path
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::try_parse_from(["taskhub", "run", "--port", "5000", "--dev"]).unwrap();
        match cli.command {
            Commands::Run(cmd) => {
                assert_eq!(cmd.port, Some(5000));
                assert!(cmd.dev);
                assert_eq!(cmd.config, "taskhub.toml");
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_parse_migrate() {
        assert!(Cli::try_parse_from(["taskhub", "migrate", "up"]).is_ok());
        assert!(Cli::try_parse_from(["taskhub", "migrate", "status", "-c", "other.toml"]).is_ok());
        assert!(Cli::try_parse_from(["taskhub", "migrate", "down"]).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[database]\nurl = \"postgres://localhost/from_file\"\n\n[gateway]\nport = 4100"
        )
        .unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.database.url, "postgres://localhost/from_file");
        assert_eq!(config.gateway.port, 4100);
    }

    #[test]
    fn test_load_config_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nurl = \"\"").unwrap();
        assert!(load_config(file.path().to_str().unwrap()).is_err());
    }
}
