/// Errors raised while reading database configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} must be a positive integer, got '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Database configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    /// Pool size (default: `20`).
    pub max_connections: u32,
}

impl DbConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default  |
    /// |----------------------|----------|
    /// | `DATABASE_URL`       | required |
    /// | `DB_MAX_CONNECTIONS` | `20`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let max_connections = parse_max_connections(std::env::var("DB_MAX_CONNECTIONS").ok())?;

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

fn parse_max_connections(raw: Option<String>) -> Result<u32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(20);
    };
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            var: "DB_MAX_CONNECTIONS",
            value: raw,
        }),
    }
}
