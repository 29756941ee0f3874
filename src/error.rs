use thiserror::Error;

/// Main error type for the forecast tracker
#[derive(Error, Debug)]
pub enum MaverickError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Lookup errors
    #[error("Not found: {0}")]
    NotFound(String),

    // Resolution errors
    #[error("Prediction already resolved: {prediction_id}")]
    AlreadyResolved { prediction_id: String },

    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MaverickError
pub type Result<T> = std::result::Result<T, MaverickError>;

impl MaverickError {
    /// True for errors caused by caller input rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MaverickError::NotFound(_)
                | MaverickError::AlreadyResolved { .. }
                | MaverickError::InvalidStateTransition { .. }
                | MaverickError::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MaverickError::NotFound("prediction pred_1234".to_string());
        assert_eq!(err.to_string(), "Not found: prediction pred_1234");

        let err = MaverickError::AlreadyResolved {
            prediction_id: "pred_1234".to_string(),
        };
        assert!(err.to_string().contains("pred_1234"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(MaverickError::Validation("bad".into()).is_client_error());
        assert!(MaverickError::NotFound("x".into()).is_client_error());
        assert!(!MaverickError::Internal("boom".into()).is_client_error());
        assert!(!MaverickError::Database(sqlx::Error::RowNotFound).is_client_error());
    }
}
