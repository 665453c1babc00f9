//! Error types for Liftlog

use thiserror::Error;

/// Result type alias using Liftlog's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Liftlog error types with helpful messages
#[derive(Error, Debug)]
pub enum Error {
    // Session errors (E001-E099)
    #[error("A workout is already in progress. End or abandon it before starting another.")]
    WorkoutInProgress,

    #[error("No workout is in progress. Run `liftlog start <template>` to begin one.")]
    NoActiveWorkout,

    #[error("Workout '{0}' not found. Run `liftlog history` to see completed workouts.")]
    WorkoutNotFound(String),

    #[error("Template '{0}' not found. Run `liftlog templates` to see available templates.")]
    TemplateNotFound(String),

    // Network errors (E100-E199)
    #[error("Network error: {0}. Check your internet connection.")]
    Network(#[from] reqwest::Error),

    #[error("Sync rejected: not authorized. The auth token may be expired.")]
    Unauthorized,

    #[error("Sync rejected by server: {0}")]
    ClientError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Failed to decode server response: {0}")]
    Decode(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored data is malformed: {0}")]
    Parse(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    Config(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::WorkoutInProgress => "E001",
            Self::NoActiveWorkout => "E002",
            Self::WorkoutNotFound(_) => "E003",
            Self::TemplateNotFound(_) => "E004",
            Self::Network(_) => "E100",
            Self::Unauthorized => "E101",
            Self::ClientError(_) => "E102",
            Self::ServerError(_) => "E103",
            Self::Decode(_) => "E104",
            Self::Database(_) => "E400",
            Self::Parse(_) => "E401",
            Self::Config(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Io(_) => "E9999",
        }
    }

    /// Whether this error is recoverable by retrying the sync later
    pub fn is_retryable_sync(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Unauthorized | Self::ServerError(_) | Self::Decode(_)
        )
    }
}
