use crate::error::DataError;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "ACADEMIC_DB_MAX_CONNECTIONS";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Process-wide backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `None` when no credentials were provided.
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, DataError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DataError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let max_connections = match lookup(MAX_CONNECTIONS_VAR) {
            Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<u32>().map_err(|_| {
                DataError::Configuration(format!(
                    "{MAX_CONNECTIONS_VAR} must be a positive integer, got `{raw}`"
                ))
            })?,
            _ => DEFAULT_MAX_CONNECTIONS,
        };

        if max_connections == 0 {
            return Err(DataError::Configuration(format!(
                "{MAX_CONNECTIONS_VAR} must be at least 1"
            )));
        }

        Ok(Self {
            database_url,
            max_connections,
        })
    }

    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.database_url.is_some()
    }
}
