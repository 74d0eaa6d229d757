use std::fmt;
use thiserror::Error;

/// The two aggregate kinds a collection can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    StopWatch,
    StaySetIndicator,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::StopWatch => write!(f, "stop watch"),
            CollectionKind::StaySetIndicator => write!(f, "stay-set indicator"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("{kind} value '{id}' does not exist in namespace '{namespace}'")]
    NotFound {
        kind: CollectionKind,
        namespace: String,
        id: String,
    },

    #[error("{kind} '{namespace}' has been stopped")]
    Stopped {
        kind: CollectionKind,
        namespace: String,
    },

    #[error("{kind} '{namespace}' command queue is full")]
    Overloaded {
        kind: CollectionKind,
        namespace: String,
    },

    #[error("No Tokio runtime available to drive the control loops")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MonitorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MonitorError::NotFound { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, MonitorError::Stopped { .. })
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = MonitorError::NotFound {
            kind: CollectionKind::StopWatch,
            namespace: "ns".to_string(),
            id: "doesnotexist".to_string(),
        };

        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "stop watch value 'doesnotexist' does not exist in namespace 'ns'"
        );
    }

    #[test]
    fn test_stopped_message() {
        let err = MonitorError::Stopped {
            kind: CollectionKind::StaySetIndicator,
            namespace: "ns".to_string(),
        };

        assert!(err.is_stopped());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "stay-set indicator 'ns' has been stopped");
    }
}
