use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `[database]` section: the Postgres instance holding users, workspaces,
/// memberships, projects, tasks and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` URL, usually `${DATABASE_URL}`.
    pub url: String,

    /// Upper bound on open connections shared by the API and sync handlers.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// How long a request waits for a free connection before failing.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_secs: u64,

    /// `statement_timeout` applied to every new connection; 0 leaves the
    /// server default.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }

    /// `None` when statements should run without a limit.
    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout_secs > 0).then(|| Duration::from_secs(self.statement_timeout_secs))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pool_size(),
            pool_timeout_secs: default_pool_timeout(),
            statement_timeout_secs: default_statement_timeout(),
        }
    }
}

fn default_pool_size() -> u32 {
    20
}

fn default_pool_timeout() -> u64 {
    30
}

fn default_statement_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.pool_size, 20);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(30));
        assert_eq!(config.statement_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_statement_timeout_disables_it() {
        let toml = r#"
            url = "postgres://localhost/taskhub"
            pool_size = 5
            statement_timeout_secs = 0
        "#;

        let config: DatabaseConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.url, "postgres://localhost/taskhub");
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.statement_timeout(), None);
        assert_eq!(config.pool_timeout_secs, 30);
    }
}
