//! Result contracts for the remote calls made during a recovery.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemoteOperation {
    AssumeRole,
    DescribeInstances,
    StartInstances,
}

impl RemoteOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AssumeRole => "AssumeRole",
            Self::DescribeInstances => "DescribeInstances",
            Self::StartInstances => "StartInstances",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum RemoteCallError {
    #[error("authorization error: {0}")]
    Authorization(String),
    #[error("permission error: {0}")]
    Permission(String),
    #[error("invalid state error: {0}")]
    InvalidState(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service error: {0}")]
    Service(String),
}

impl RemoteCallError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authorization(_) => "authorization",
            Self::Permission(_) => "permission",
            Self::InvalidState(_) => "invalid_state",
            Self::Transport(_) => "transport",
            Self::Service(_) => "service",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Authorization(message)
            | Self::Permission(message)
            | Self::InvalidState(message)
            | Self::Transport(message)
            | Self::Service(message) => message,
        }
    }
}

const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "AuthFailure",
    "InvalidClientTokenId",
    "ExpiredToken",
];

const INVALID_STATE_CODES: &[&str] = &["IncorrectInstanceState", "IncorrectState"];

/// Maps a service error code returned by `operation` onto an error kind.
///
/// Any rejection of a role assumption is an authorization failure. For EC2
/// calls, access-denied codes become permission errors and state conflicts
/// (e.g. starting an instance that is still stopping) become invalid-state
/// errors.
pub fn classify_service_error(
    operation: RemoteOperation,
    code: Option<&str>,
    message: impl Into<String>,
) -> RemoteCallError {
    let message = message.into();
    match operation {
        RemoteOperation::AssumeRole => RemoteCallError::Authorization(message),
        RemoteOperation::DescribeInstances | RemoteOperation::StartInstances => match code {
            Some(code) if ACCESS_DENIED_CODES.contains(&code) => {
                RemoteCallError::Permission(message)
            }
            Some(code) if INVALID_STATE_CODES.contains(&code) => {
                RemoteCallError::InvalidState(message)
            }
            _ => RemoteCallError::Service(message),
        },
    }
}

/// Instance ids visible to the assumed role, in the order the service
/// returned them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RemoteInstanceSet {
    instance_ids: Vec<String>,
}

impl RemoteInstanceSet {
    pub fn new(instance_ids: Vec<String>) -> Self {
        Self { instance_ids }
    }

    pub fn instance_ids(&self) -> &[String] {
        &self.instance_ids
    }

    pub fn len(&self) -> usize {
        self.instance_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instance_ids.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceStateChange {
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartInstancesResponse {
    pub starting_instances: Vec<InstanceStateChange>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn assume_role_rejections_are_authorization_errors() {
        for code in [Some("AccessDenied"), Some("Throttling"), None] {
            let error = classify_service_error(RemoteOperation::AssumeRole, code, "denied");
            assert_eq!(error, RemoteCallError::Authorization("denied".to_string()));
        }
    }

    #[test]
    fn ec2_codes_map_to_kinds() {
        let error = classify_service_error(
            RemoteOperation::DescribeInstances,
            Some("UnauthorizedOperation"),
            "not allowed",
        );
        assert_eq!(error.kind(), "permission");

        let error = classify_service_error(
            RemoteOperation::StartInstances,
            Some("IncorrectInstanceState"),
            "instance is stopping",
        );
        assert_eq!(error.kind(), "invalid_state");
        assert_eq!(error.message(), "instance is stopping");

        let error = classify_service_error(
            RemoteOperation::StartInstances,
            Some("InvalidInstanceID.NotFound"),
            "no such instance",
        );
        assert_eq!(error, RemoteCallError::Service("no such instance".to_string()));
    }

    #[test]
    fn remote_error_serializes_kind_and_message() {
        let error = RemoteCallError::Transport("connection reset".to_string());
        assert_eq!(
            serde_json::to_value(&error).expect("error should serialize"),
            json!({"kind": "transport", "message": "connection reset"})
        );
        assert_eq!(error.to_string(), "transport error: connection reset");
    }

    #[test]
    fn start_response_omits_unknown_states() {
        let response = StartInstancesResponse {
            starting_instances: vec![InstanceStateChange {
                instance_id: "i-0123".to_string(),
                previous_state: Some("stopped".to_string()),
                current_state: None,
            }],
        };

        assert_eq!(
            serde_json::to_value(&response).expect("response should serialize"),
            json!({
                "starting_instances": [
                    {"instance_id": "i-0123", "previous_state": "stopped"}
                ]
            })
        );
    }
}
