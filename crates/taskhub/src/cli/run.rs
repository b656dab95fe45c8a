use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use taskhub::TaskHub;
use taskhub_core::config::{ObservabilityConfig, TaskHubConfig};

/// Run the API server.
#[derive(Parser)]
pub struct RunCommand {
    /// Configuration file path.
    #[arg(short, long, default_value = "taskhub.toml")]
    pub config: String,

    /// Port to listen on (overrides config).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    pub host: Option<String>,

    /// Development mode: debug logging and unverified bearer tokens.
    #[arg(long)]
    pub dev: bool,
}

impl RunCommand {
    pub async fn execute(self) -> Result<()> {
        let config = self.resolve_config()?;
        init_tracing(&config.observability, self.dev);

        println!();
        println!(
            "  {} v{}",
            style("TaskHub").bold().cyan(),
            env!("CARGO_PKG_VERSION")
        );
        println!();
        println!(
            "  {} Listening on {}",
            style("→").dim(),
            style(format!(
                "http://{}:{}",
                config.gateway.host, config.gateway.port
            ))
            .cyan()
        );
        if self.dev {
            println!(
                "  {} Development mode: token signatures are not verified",
                style("!").yellow()
            );
        }
        println!();

        let hub = TaskHub::builder().config(config).build()?;
        hub.run().await?;

        println!("\n  {} Stopped", style("✓").green());
        Ok(())
    }

    fn resolve_config(&self) -> Result<TaskHubConfig> {
        let mut config = super::load_config(&self.config)?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut TaskHubConfig) {
        if let Some(port) = self.port {
            config.gateway.port = port;
        }
        if let Some(host) = &self.host {
            config.gateway.host = host.clone();
        }
        if self.dev {
            config.auth.skip_verification = true;
        }
    }
}

/// `RUST_LOG` wins over the configured level; `--dev` raises the default to debug.
fn init_tracing(observability: &ObservabilityConfig, dev: bool) {
    let default_level = if dev {
        "debug"
    } else {
        observability.log_level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if observability.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(port: Option<u16>, host: Option<&str>, dev: bool) -> RunCommand {
        RunCommand {
            config: "taskhub.toml".to_string(),
            port,
            host: host.map(String::from),
            dev,
        }
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = TaskHubConfig::default_with_database_url("postgres://localhost/t");
        cmd(None, None, false).apply_overrides(&mut config);
        assert_eq!(config.gateway.port, 4000);
        assert_eq!(config.gateway.host, "0.0.0.0");
        assert!(!config.auth.skip_verification);
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = TaskHubConfig::default_with_database_url("postgres://localhost/t");
        cmd(Some(3000), Some("127.0.0.1"), true).apply_overrides(&mut config);
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert!(config.auth.skip_verification);
    }
}
