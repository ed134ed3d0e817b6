//! Lifecycle event parsing and the recovery filter.
//!
//! Events arrive as arbitrary JSON. Every lookup is defensive: a missing or
//! wrong-typed field is treated as absent, so parsing never fails.

use serde::Serialize;
use serde_json::Value;

/// The only lifecycle state that triggers a recovery.
pub const STOPPED_STATE: &str = "stopped";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub region: Option<String>,
    pub state: Option<String>,
    pub instance_id: Option<String>,
}

impl LifecycleEvent {
    pub fn from_value(event: &Value) -> Self {
        let detail = event.get("detail");
        Self {
            region: non_blank_string(event.get("region")),
            state: string_field(detail.and_then(|detail| detail.get("state"))),
            instance_id: string_field(detail.and_then(|detail| detail.get("instance-id"))),
        }
    }

    /// Region to act in, falling back when the event does not carry one.
    pub fn region_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.region.as_deref().unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryTarget {
    pub instance_id: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NotStopped { state: Option<String> },
    MissingInstanceId,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotStopped { .. } => "event is not a stopped instance; no action taken",
            Self::MissingInstanceId => "stopped event has no instance id; no action taken",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryDecision {
    Recover(RecoveryTarget),
    Skip(SkipReason),
}

/// Decides whether an event warrants a recovery attempt.
///
/// Recovery proceeds only when the state is exactly `stopped` and the
/// instance id is present and non-empty.
pub fn decide(event: &LifecycleEvent, default_region: &str) -> RecoveryDecision {
    if event.state.as_deref() != Some(STOPPED_STATE) {
        return RecoveryDecision::Skip(SkipReason::NotStopped {
            state: event.state.clone(),
        });
    }

    match event.instance_id.as_deref() {
        Some(instance_id) if !instance_id.is_empty() => RecoveryDecision::Recover(RecoveryTarget {
            instance_id: instance_id.to_string(),
            region: event.region_or(default_region).to_string(),
        }),
        _ => RecoveryDecision::Skip(SkipReason::MissingInstanceId),
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn non_blank_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_eventbridge_state_change_notification() {
        let event = LifecycleEvent::from_value(&json!({
            "version": "0",
            "detail-type": "EC2 Instance State-change Notification",
            "source": "aws.ec2",
            "region": "us-west-2",
            "detail": {"instance-id": "i-0123", "state": "stopped"}
        }));

        assert_eq!(event.region.as_deref(), Some("us-west-2"));
        assert_eq!(event.state.as_deref(), Some("stopped"));
        assert_eq!(event.instance_id.as_deref(), Some("i-0123"));
    }

    #[test]
    fn tolerates_missing_and_wrong_typed_fields() {
        let event = LifecycleEvent::from_value(&json!({
            "region": 42,
            "detail": {"state": ["stopped"], "instance-id": null}
        }));
        assert_eq!(event.region, None);
        assert_eq!(event.state, None);
        assert_eq!(event.instance_id, None);

        let event = LifecycleEvent::from_value(&json!("not an object"));
        assert_eq!(event.state, None);

        let event = LifecycleEvent::from_value(&json!({"detail": "flat"}));
        assert_eq!(event.instance_id, None);
    }

    #[test]
    fn blank_region_falls_back_to_default() {
        let event = LifecycleEvent::from_value(&json!({
            "region": "  ",
            "detail": {"state": "stopped", "instance-id": "i-0123"}
        }));

        assert_eq!(event.region_or("us-east-1"), "us-east-1");
    }

    #[test]
    fn stopped_event_with_instance_id_qualifies() {
        let event = LifecycleEvent::from_value(&json!({
            "detail": {"state": "stopped", "instance-id": "i-0123"}
        }));

        assert_eq!(
            decide(&event, "us-east-1"),
            RecoveryDecision::Recover(RecoveryTarget {
                instance_id: "i-0123".to_string(),
                region: "us-east-1".to_string(),
            })
        );
    }

    #[test]
    fn other_states_are_skipped() {
        for state in ["running", "stopping", "pending", "terminated", "Stopped"] {
            let event = LifecycleEvent::from_value(&json!({
                "detail": {"state": state, "instance-id": "i-0123"}
            }));
            assert_eq!(
                decide(&event, "us-east-1"),
                RecoveryDecision::Skip(SkipReason::NotStopped {
                    state: Some(state.to_string()),
                })
            );
        }
    }

    #[test]
    fn stopped_event_without_instance_id_is_skipped() {
        for detail in [
            json!({"state": "stopped"}),
            json!({"state": "stopped", "instance-id": ""}),
        ] {
            let event = LifecycleEvent::from_value(&json!({ "detail": detail }));
            assert_eq!(
                decide(&event, "us-east-1"),
                RecoveryDecision::Skip(SkipReason::MissingInstanceId)
            );
        }
    }

    #[test]
    fn skip_reason_serializes_with_tag() {
        let reason = SkipReason::NotStopped {
            state: Some("running".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&reason).expect("reason should serialize"),
            json!({"reason": "not_stopped", "state": "running"})
        );
    }
}
