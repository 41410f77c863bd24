//! Unified error hierarchy for vitalrs
//!
//! Tracking never aborts the process: sensor errors disable a metric, workout
//! errors reach the stop outcome, gateway errors reach the caller.

use thiserror::Error;

/// Top-level error type for all vitalrs operations
#[derive(Debug, Error)]
pub enum VitalRsError {
    /// Sensor feed errors
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Workout session lifecycle errors
    #[error("Workout error: {0}")]
    Workout(#[from] WorkoutError),

    /// Persistence gateway errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Rejected user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Event loop or channel failures
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Sensor and health-store errors
#[derive(Debug, Error)]
pub enum SensorError {
    /// The device cannot provide this feed
    #[error("{feed} is not available on this device")]
    Unavailable { feed: String },

    /// The user declined access
    #[error("Permission denied for {feed}")]
    PermissionDenied { feed: String },

    /// The feed needs an async runtime that is not running
    #[error("{feed} requires a running event loop")]
    NoRuntime { feed: String },
}

/// Workout session errors
#[derive(Debug, Error)]
pub enum WorkoutError {
    /// The session could not be created or started
    #[error("Failed to start workout: {reason}")]
    BeginFailed { reason: String },

    /// Ending data collection failed
    #[error("Failed to end workout collection: {reason}")]
    EndCollectionFailed { reason: String },

    /// Finishing the workout failed
    #[error("Failed to finish workout: {reason}")]
    FinishFailed { reason: String },

    /// Stop was requested but no workout was ever started
    #[error("No workout session is running")]
    NotRunning,
}

/// Persistence gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend answered with a non-success status
    #[error("Backend returned {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never completed
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local database failure
    #[error("Storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The local database file or its directory is unusable
    #[error("Cannot access {path}: {source}")]
    LocalFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Table names are restricted to ASCII letters, digits and `_`
    #[error("Invalid table name: {0:?}")]
    InvalidTable(String),

    /// A response could not be decoded
    #[error("Malformed response: {reason}")]
    Decode { reason: String },

    /// An operation needs a signed-in user
    #[error("No user is logged in")]
    NotLoggedIn,
}

/// Result type alias for vitalrs operations
pub type Result<T> = std::result::Result<T, VitalRsError>;

impl VitalRsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VitalRsError::Sensor(_) => ErrorSeverity::Info,
            VitalRsError::Validation(_) => ErrorSeverity::Warning,
            VitalRsError::Workout(WorkoutError::BeginFailed { .. }) => ErrorSeverity::Warning,
            VitalRsError::Workout(_) => ErrorSeverity::Error,
            VitalRsError::Gateway(GatewayError::NotLoggedIn) => ErrorSeverity::Warning,
            VitalRsError::Gateway(_) => ErrorSeverity::Error,
            VitalRsError::Auth(_) => ErrorSeverity::Error,
            VitalRsError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Message suitable for an alert dialog
    pub fn user_message(&self) -> String {
        match self {
            VitalRsError::Workout(err) => format!("Failed to save activity: {}", err),
            VitalRsError::Sensor(SensorError::PermissionDenied { .. }) => {
                "Health permissions are needed for tracking activities.".to_string()
            }
            VitalRsError::Gateway(GatewayError::NotLoggedIn) => {
                "Please log in before saving activities.".to_string()
            }
            VitalRsError::Gateway(GatewayError::Transport(_)) => {
                "Unable to reach the backend. Please check your connection.".to_string()
            }
            VitalRsError::Validation(_) => "Please enter all values to insert".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The event loop itself is broken
    Critical,
    /// Operation failed, tracking continues
    Error,
    /// Degraded data or rejected input
    Warning,
    /// Expected on some devices
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = VitalRsError::Sensor(SensorError::Unavailable {
            feed: "pedometer".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Info);

        let err = VitalRsError::Workout(WorkoutError::BeginFailed {
            reason: "busy".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = VitalRsError::Internal("loop gone".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_user_messages() {
        let err = VitalRsError::Workout(WorkoutError::NotRunning);
        assert!(err.user_message().starts_with("Failed to save activity"));

        let err = VitalRsError::Validation("calories".to_string());
        assert_eq!(err.user_message(), "Please enter all values to insert");
    }
}
