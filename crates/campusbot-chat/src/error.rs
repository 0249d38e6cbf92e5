//! Error types for the chat session client.

use campusbot_core::error::CampusError;

/// Errors from the chat session.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("chat service has stopped")]
    ServiceClosed,
    #[error(transparent)]
    Backend(#[from] CampusError),
}

impl ChatError {
    /// Whether this failure was caught before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyMessage
                | ChatError::MessageTooLong(_)
                | ChatError::Backend(CampusError::Validation(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(ChatError::ServiceClosed.to_string(), "chat service has stopped");
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let err: ChatError = CampusError::server(500, "db error").into();
        assert_eq!(err.to_string(), "Server error (500): db error");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_classification() {
        assert!(ChatError::EmptyMessage.is_validation());
        assert!(ChatError::MessageTooLong(1).is_validation());
        assert!(ChatError::Backend(CampusError::Validation("x".into())).is_validation());
        assert!(!ChatError::ServiceClosed.is_validation());
    }
}
