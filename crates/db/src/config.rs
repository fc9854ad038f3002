use crate::error::DbError;

/// Database configuration loaded from environment variables.
///
/// | Env Var                   | Default  |
/// |---------------------------|----------|
/// | `DATABASE_URL`            | required |
/// | `DB_MAX_CONNECTIONS`      | `20`     |
/// | `DB_ACQUIRE_TIMEOUT_SECS` | `5`      |
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DbConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, DbError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DbError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| DbError::Config("DATABASE_URL must be set".into()))?;

        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 20u32)?;
        if max_connections == 0 {
            return Err(DbError::Config(
                "DB_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }

        let acquire_timeout_secs = parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5u64)?;

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout_secs,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, DbError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DbError::Config(format!("{key} must be a number, got '{raw}'"))),
    }
}
