use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome messages of workspace creation.
///
/// Every variant but [`Message::WorkspaceCreateSuccessful`] is a failure
/// carrying a user-facing detail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Message {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Workspace create params validation failed: {0}")]
    WorkspaceCreateParamsValidationFailed(String),

    #[error("Workspace create devfile load failed: {0}")]
    WorkspaceCreateDevfileLoadFailed(String),

    #[error("Workspace create devfile yaml parse failed: {0}")]
    WorkspaceCreateDevfileYamlParseFailed(String),

    #[error("Workspace create pre flatten devfile validation failed: {0}")]
    WorkspaceCreatePreFlattenDevfileValidationFailed(String),

    #[error("Workspace create devfile flatten failed: {0}")]
    WorkspaceCreateDevfileFlattenFailed(String),

    #[error("Workspace create post flatten devfile validation failed: {0}")]
    WorkspaceCreatePostFlattenDevfileValidationFailed(String),

    #[error("Workspace create failed: {0}")]
    WorkspaceCreateFailed(String),

    #[error("Workspace create successful")]
    WorkspaceCreateSuccessful(Box<Workspace>),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Unauthorized(_) => "Unauthorized",
            Message::WorkspaceCreateParamsValidationFailed(_) => "WorkspaceCreateParamsValidationFailed",
            Message::WorkspaceCreateDevfileLoadFailed(_) => "WorkspaceCreateDevfileLoadFailed",
            Message::WorkspaceCreateDevfileYamlParseFailed(_) => "WorkspaceCreateDevfileYamlParseFailed",
            Message::WorkspaceCreatePreFlattenDevfileValidationFailed(_) => {
                "WorkspaceCreatePreFlattenDevfileValidationFailed"
            }
            Message::WorkspaceCreateDevfileFlattenFailed(_) => "WorkspaceCreateDevfileFlattenFailed",
            Message::WorkspaceCreatePostFlattenDevfileValidationFailed(_) => {
                "WorkspaceCreatePostFlattenDevfileValidationFailed"
            }
            Message::WorkspaceCreateFailed(_) => "WorkspaceCreateFailed",
            Message::WorkspaceCreateSuccessful(_) => "WorkspaceCreateSuccessful",
        }
    }

    /// Detail of a failure message.
    pub fn details(&self) -> Option<&str> {
        match self {
            Message::Unauthorized(details)
            | Message::WorkspaceCreateParamsValidationFailed(details)
            | Message::WorkspaceCreateDevfileLoadFailed(details)
            | Message::WorkspaceCreateDevfileYamlParseFailed(details)
            | Message::WorkspaceCreatePreFlattenDevfileValidationFailed(details)
            | Message::WorkspaceCreateDevfileFlattenFailed(details)
            | Message::WorkspaceCreatePostFlattenDevfileValidationFailed(details)
            | Message::WorkspaceCreateFailed(details) => Some(details),
            Message::WorkspaceCreateSuccessful(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Unauthorized,
    BadRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub workspace: Workspace,
}

/// What creation reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: ResponseStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

impl Response {
    pub fn success(workspace: Workspace) -> Self {
        Self {
            status: ResponseStatus::Success,
            payload: Some(Payload { workspace }),
            message: None,
            reason: None,
        }
    }

    pub fn error(message: String, reason: Reason) -> Self {
        Self {
            status: ResponseStatus::Error,
            payload: None,
            message: Some(message),
            reason: Some(reason),
        }
    }
}

/// A creation result that maps to no response. Always a programming error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unmatched result type: {0}")]
pub struct UnmatchedResultError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages_are_prefixed() {
        let message = Message::WorkspaceCreateDevfileLoadFailed(
            "Devfile path 'x.yaml' at ref 'main' does not exist in project repository".to_string(),
        );
        assert_eq!(
            message.to_string(),
            "Workspace create devfile load failed: Devfile path 'x.yaml' at ref 'main' does not exist in project repository"
        );
        assert_eq!(message.kind(), "WorkspaceCreateDevfileLoadFailed");
    }

    #[test]
    fn test_error_response_serialization() {
        let response = Response::error("Unauthorized: nope".to_string(), Reason::Unauthorized);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "status": "error",
                "message": "Unauthorized: nope",
                "reason": "unauthorized"
            })
        );
    }
}
