//! Provider error types

use crate::client::ClientError;
use crate::wire::WireError;
use rtask_engine::EngineError;
use rtask_variant::ValidationError;

/// Errors of the resource lifecycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Desired record is invalid; nothing was sent
    #[error("invalid recurring task: {}", join(.0))]
    Validation(Vec<ValidationError>),

    /// Engine invariant broken
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Server body could not be converted
    #[error(transparent)]
    Wire(#[from] WireError),

    /// Request failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// State has no record yet; read it first
    #[error("recurring task '{0}' has not been read since import")]
    NotLoaded(String),
}

impl ProviderError {
    /// Check if retrying the operation may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_retryable(),
            _ => false,
        }
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtask_record::FieldName;

    #[test]
    fn validation_lists_every_error() {
        let error = ProviderError::Validation(vec![
            ValidationError::MissingRequiredField {
                field: FieldName::from_static("command_path"),
                variant: "exec".to_string(),
            },
            ValidationError::FieldNotApplicable {
                field: FieldName::from_static("reason"),
                variant: "exec".to_string(),
            },
        ]);
        let message = error.to_string();
        assert!(message.contains("command_path"));
        assert!(message.contains("reason"));
    }

    #[test]
    fn only_client_errors_retry() {
        assert!(ProviderError::from(ClientError::Transport("timeout".to_string())).is_retryable());
        assert!(!ProviderError::from(EngineError::AdoptRequiresObserved).is_retryable());
        assert!(!ProviderError::Validation(Vec::new()).is_retryable());
    }
}
