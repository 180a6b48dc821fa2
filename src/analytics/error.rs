//! Error types for analytics operations

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur in analytics operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    /// Not enough values for the statistic
    #[error("Insufficient sample: need at least {required} values, got {available}")]
    InsufficientSample { required: usize, available: usize },

    /// All values identical, z-scores undefined
    #[error("Zero variance: all values are identical")]
    ZeroVariance,

    /// Nothing matched the query
    #[error("Empty dataset")]
    EmptyDataset,

    /// Store request failed
    #[error("Store error: {0}")]
    Store(String),

    /// Field cannot be analyzed
    #[error("Invalid field: {0}")]
    InvalidField(String),
}

impl From<AppError> for AnalyticsError {
    fn from(err: AppError) -> Self {
        AnalyticsError::Store(err.to_string())
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Store(msg) => AppError::Database(msg),
            AnalyticsError::InvalidField(msg) => AppError::Validation(msg),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_sample_message() {
        let err = AnalyticsError::InsufficientSample {
            required: 2,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient sample: need at least 2 values, got 1"
        );
    }

    #[test]
    fn test_conversion_into_app_error() {
        let app: AppError = AnalyticsError::InvalidField("device_id".to_string()).into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");

        let app: AppError = AnalyticsError::ZeroVariance.into();
        assert_eq!(app.error_code(), "INTERNAL_ERROR");
    }
}
