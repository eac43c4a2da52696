use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Done {
        result_ref: Option<String>,
        provider_error: Option<String>,
    },
}

/// Handle to a long-running provider operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncJobHandle {
    /// Provider operation name, e.g. `models/veo/operations/abc123`.
    pub operation: String,
    pub state: JobState,
}

impl AsyncJobHandle {
    pub fn pending(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            state: JobState::Pending,
        }
    }

    pub fn done(operation: impl Into<String>, result_ref: Option<String>) -> Self {
        Self {
            operation: operation.into(),
            state: JobState::Done {
                result_ref,
                provider_error: None,
            },
        }
    }

    pub fn failed(operation: impl Into<String>, provider_error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            state: JobState::Done {
                result_ref: None,
                provider_error: Some(provider_error.into()),
            },
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, JobState::Done { .. })
    }

    /// Non-empty result reference, once done.
    pub fn result_ref(&self) -> Option<&str> {
        match &self.state {
            JobState::Done {
                result_ref: Some(uri),
                ..
            } if !uri.trim().is_empty() => Some(uri.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_result_ref_is_absent() {
        assert_eq!(AsyncJobHandle::pending("op").result_ref(), None);
        assert_eq!(AsyncJobHandle::done("op", Some("  ".into())).result_ref(), None);
        assert_eq!(
            AsyncJobHandle::done("op", Some("https://x/v.mp4".into())).result_ref(),
            Some("https://x/v.mp4")
        );
        assert!(AsyncJobHandle::failed("op", "boom").is_done());
    }
}
