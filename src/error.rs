use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("API key is not set. Add a Gemini API key in settings.")]
    CredentialNotSet,

    #[error("API key is not valid. Check it in settings.")]
    InvalidCredential,

    #[error("The API did not return any image or text content.")]
    EmptyResponse,

    #[error("Failed to get generation status: {0}")]
    Polling(String),

    #[error("The API did not return a result for {operation}{}", provider_error.as_ref().map(|e| format!(": {}", e)).unwrap_or_default())]
    MissingResult {
        operation: String,
        provider_error: Option<String>,
    },

    #[error("Generation did not finish after {attempts} status checks ({:.1}s)", elapsed.as_secs_f64())]
    Timeout { attempts: u32, elapsed: Duration },

    #[error("Generation cancelled")]
    Cancelled,

    #[error("Failed to {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StudioError {
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        StudioError::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Text shown in place of a result when a submission fails.
    pub fn user_message(&self) -> String {
        match self {
            StudioError::MissingInput(what) => format!("Please provide {}.", what),
            other => other.to_string(),
        }
    }

    /// Errors that end a submission because of user input rather than the provider.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StudioError::MissingInput(_) | StudioError::CredentialNotSet
        )
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
