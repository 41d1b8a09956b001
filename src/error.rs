/// Message surfaced whenever an operation runs without backend credentials.
pub const NOT_CONFIGURED: &str = "backend is not configured; set DATABASE_URL before loading data";

/// Failures raised by the data access layer.
///
/// Both variants display the bare message so callers can surface it verbatim.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Credentials are absent or unusable; no request was attempted.
    #[error("{0}")]
    Configuration(String),

    /// The backend rejected or failed a request.
    #[error("{0}")]
    Backend(String),
}

impl DataError {
    pub fn not_configured() -> Self {
        Self::Configuration(NOT_CONFIGURED.to_string())
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => Self::Backend(db.message().to_string()),
            sqlx::Error::Configuration(source) => Self::Configuration(source.to_string()),
            _ => Self::Backend(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_not_prefixed() {
        let err = DataError::Backend("duplicate key value".to_string());
        assert_eq!(err.to_string(), "duplicate key value");
        assert!(!matches!(err, DataError::Configuration(_)));
    }

    #[test]
    fn not_configured_is_a_configuration_error() {
        let err = DataError::not_configured();
        assert!(matches!(err, DataError::Configuration(_)));
        assert_eq!(err.to_string(), NOT_CONFIGURED);
    }

    #[test]
    fn row_not_found_maps_to_backend_error() {
        let err = DataError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DataError::Backend(_)));
    }
}
