//! Scripted adapters for exercising the recovery handler without AWS.
//!
//! Every fake records its calls so tests can assert exactly which remote
//! operations an invocation attempted.

use std::sync::Mutex;

use instance_recovery_core::credentials::TemporaryCredentials;
use instance_recovery_core::remote::{
    InstanceStateChange, RemoteCallError, RemoteInstanceSet, StartInstancesResponse,
};
use serde_json::Value;

use crate::adapters::instances::InstanceGateway;
use crate::adapters::log::RecoveryLog;
use crate::adapters::role::RoleAssumer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub event: String,
    pub details: Value,
}

#[derive(Debug, Default)]
pub struct CapturingLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl CapturingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("poisoned mutex").clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|entry| entry.event)
            .collect()
    }

    pub fn find(&self, event: &str) -> Option<LogEntry> {
        self.entries().into_iter().find(|entry| entry.event == event)
    }

    pub fn last(&self) -> Option<LogEntry> {
        self.entries().pop()
    }

    pub fn errors(&self) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == LogLevel::Error)
            .collect()
    }

    /// All entries rendered as one string, for leak checks.
    pub fn rendered(&self) -> String {
        self.entries()
            .iter()
            .map(|entry| format!("{} {}", entry.event, entry.details))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&self, level: LogLevel, event: &str, details: Value) {
        self.entries
            .lock()
            .expect("poisoned mutex")
            .push(LogEntry {
                level,
                event: event.to_string(),
                details,
            });
    }
}

impl RecoveryLog for CapturingLog {
    fn info(&self, event: &str, details: Value) {
        self.push(LogLevel::Info, event, details);
    }

    fn error(&self, event: &str, details: Value) {
        self.push(LogLevel::Error, event, details);
    }
}

pub struct ScriptedRoleAssumer {
    result: Result<TemporaryCredentials, RemoteCallError>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedRoleAssumer {
    pub const ACCESS_KEY_ID: &'static str = "ASIAEXAMPLEKEY123";
    pub const SECRET_ACCESS_KEY: &'static str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";
    pub const SESSION_TOKEN: &'static str = "FwoGZXIvYXdzEXAMPLETOKEN";

    pub fn succeeding() -> Self {
        Self::with_result(Ok(TemporaryCredentials::new(
            Self::ACCESS_KEY_ID,
            Self::SECRET_ACCESS_KEY,
            Self::SESSION_TOKEN,
        )))
    }

    pub fn failing(error: RemoteCallError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<TemporaryCredentials, RemoteCallError>) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(role_arn, session_name)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

impl RoleAssumer for ScriptedRoleAssumer {
    fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, RemoteCallError> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push((role_arn.to_string(), session_name.to_string()));
        self.result.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeCall {
    pub access_key_id: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCall {
    pub access_key_id: String,
    pub region: String,
    pub instance_ids: Vec<String>,
}

pub struct ScriptedGateway {
    describe_result: Result<RemoteInstanceSet, RemoteCallError>,
    start_error: Option<RemoteCallError>,
    describe_calls: Mutex<Vec<DescribeCall>>,
    start_calls: Mutex<Vec<StartCall>>,
}

impl ScriptedGateway {
    /// Lists two instances and reports every started instance as pending.
    pub fn succeeding() -> Self {
        Self {
            describe_result: Ok(RemoteInstanceSet::new(vec![
                "i-0123".to_string(),
                "i-0456".to_string(),
            ])),
            start_error: None,
            describe_calls: Mutex::new(Vec::new()),
            start_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_describe_error(mut self, error: RemoteCallError) -> Self {
        self.describe_result = Err(error);
        self
    }

    pub fn with_start_error(mut self, error: RemoteCallError) -> Self {
        self.start_error = Some(error);
        self
    }

    pub fn describe_calls(&self) -> Vec<DescribeCall> {
        self.describe_calls.lock().expect("poisoned mutex").clone()
    }

    pub fn start_calls(&self) -> Vec<StartCall> {
        self.start_calls.lock().expect("poisoned mutex").clone()
    }

    pub fn remote_call_count(&self) -> usize {
        self.describe_calls().len() + self.start_calls().len()
    }
}

impl InstanceGateway for ScriptedGateway {
    fn describe_instance_ids(
        &self,
        credentials: &TemporaryCredentials,
        region: &str,
    ) -> Result<RemoteInstanceSet, RemoteCallError> {
        self.describe_calls
            .lock()
            .expect("poisoned mutex")
            .push(DescribeCall {
                access_key_id: credentials.access_key_id().to_string(),
                region: region.to_string(),
            });
        self.describe_result.clone()
    }

    fn start_instances(
        &self,
        credentials: &TemporaryCredentials,
        region: &str,
        instance_ids: &[String],
    ) -> Result<StartInstancesResponse, RemoteCallError> {
        self.start_calls
            .lock()
            .expect("poisoned mutex")
            .push(StartCall {
                access_key_id: credentials.access_key_id().to_string(),
                region: region.to_string(),
                instance_ids: instance_ids.to_vec(),
            });

        if let Some(error) = &self.start_error {
            return Err(error.clone());
        }

        Ok(StartInstancesResponse {
            starting_instances: instance_ids
                .iter()
                .map(|instance_id| InstanceStateChange {
                    instance_id: instance_id.clone(),
                    previous_state: Some("stopped".to_string()),
                    current_state: Some("pending".to_string()),
                })
                .collect(),
        })
    }
}
