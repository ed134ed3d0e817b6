use instance_recovery_core::config::RecoveryConfig;
use instance_recovery_core::credentials::TemporaryCredentials;
use instance_recovery_core::event::{
    decide, LifecycleEvent, RecoveryDecision, RecoveryTarget, SkipReason,
};
use instance_recovery_core::remote::{
    RemoteCallError, RemoteInstanceSet, RemoteOperation, StartInstancesResponse,
};
use serde_json::{json, Value};

use crate::adapters::instances::InstanceGateway;
use crate::adapters::log::RecoveryLog;
use crate::adapters::role::RoleAssumer;

/// Terminal state of one handler invocation.
///
/// Every variant is a successful invocation from the trigger's point of
/// view; only the log stream and this value distinguish the outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Skipped(SkipReason),
    RoleFailed(RemoteCallError),
    Attempted {
        enumeration: Result<RemoteInstanceSet, RemoteCallError>,
        start: Result<StartInstancesResponse, RemoteCallError>,
    },
}

impl RecoveryOutcome {
    pub fn started(&self) -> bool {
        matches!(self, Self::Attempted { start: Ok(_), .. })
    }
}

pub struct RecoveryHandler<'a> {
    config: &'a RecoveryConfig,
    role_assumer: &'a dyn RoleAssumer,
    instances: &'a dyn InstanceGateway,
    log: &'a dyn RecoveryLog,
}

impl<'a> RecoveryHandler<'a> {
    pub fn new(
        config: &'a RecoveryConfig,
        role_assumer: &'a dyn RoleAssumer,
        instances: &'a dyn InstanceGateway,
        log: &'a dyn RecoveryLog,
    ) -> Self {
        Self {
            config,
            role_assumer,
            instances,
            log,
        }
    }

    pub fn handle(&self, event: &Value) -> RecoveryOutcome {
        self.log.info("event_received", json!({ "event": event }));

        let parsed = LifecycleEvent::from_value(event);
        self.log.info(
            "event_parsed",
            json!({
                "state": parsed.state,
                "instance_id": parsed.instance_id,
                "region": parsed.region_or(&self.config.default_region),
            }),
        );

        match decide(&parsed, &self.config.default_region) {
            RecoveryDecision::Recover(target) => self.recover(&target),
            RecoveryDecision::Skip(reason) => {
                self.log.info(
                    "no_action",
                    json!({
                        "message": reason.message(),
                        "skip": reason,
                    }),
                );
                RecoveryOutcome::Skipped(reason)
            }
        }
    }

    fn recover(&self, target: &RecoveryTarget) -> RecoveryOutcome {
        self.log.info(
            "recovery_started",
            json!({
                "instance_id": target.instance_id,
                "region": target.region,
            }),
        );

        let credentials = match self.assume_role() {
            Ok(credentials) => credentials,
            Err(error) => return RecoveryOutcome::RoleFailed(error),
        };

        // Enumeration only probes visibility; its failure never blocks the start.
        let enumeration = self.enumerate(&credentials, target);
        let start = self.start(&credentials, target);

        RecoveryOutcome::Attempted { enumeration, start }
    }

    fn assume_role(&self) -> Result<TemporaryCredentials, RemoteCallError> {
        let result = self
            .role_assumer
            .assume_role(&self.config.role_arn, &self.config.session_name);

        match &result {
            Ok(credentials) => self.log.info(
                "assume_role_succeeded",
                json!({
                    "role_arn": self.config.role_arn,
                    "session_name": self.config.session_name,
                    "access_key_id": credentials.redacted_access_key_id(),
                }),
            ),
            Err(error) => self.log_failure(
                "assume_role_failed",
                RemoteOperation::AssumeRole,
                error,
                json!({
                    "role_arn": self.config.role_arn,
                    "session_name": self.config.session_name,
                }),
            ),
        }
        result
    }

    fn enumerate(
        &self,
        credentials: &TemporaryCredentials,
        target: &RecoveryTarget,
    ) -> Result<RemoteInstanceSet, RemoteCallError> {
        let result = self
            .instances
            .describe_instance_ids(credentials, &target.region);

        match &result {
            Ok(instances) => self.log.info(
                "instances_enumerated",
                json!({
                    "region": target.region,
                    "count": instances.len(),
                    "instance_ids": instances,
                }),
            ),
            Err(error) => self.log_failure(
                "enumeration_failed",
                RemoteOperation::DescribeInstances,
                error,
                json!({ "region": target.region }),
            ),
        }
        result
    }

    fn start(
        &self,
        credentials: &TemporaryCredentials,
        target: &RecoveryTarget,
    ) -> Result<StartInstancesResponse, RemoteCallError> {
        let instance_ids = [target.instance_id.clone()];
        let result = self
            .instances
            .start_instances(credentials, &target.region, &instance_ids);

        match &result {
            Ok(response) => self.log.info(
                "start_instances_succeeded",
                json!({
                    "instance_id": target.instance_id,
                    "region": target.region,
                    "response": response,
                }),
            ),
            Err(error) => self.log_failure(
                "start_instances_failed",
                RemoteOperation::StartInstances,
                error,
                json!({
                    "instance_id": target.instance_id,
                    "region": target.region,
                }),
            ),
        }
        result
    }

    fn log_failure(
        &self,
        event: &str,
        operation: RemoteOperation,
        error: &RemoteCallError,
        mut details: Value,
    ) {
        if let Some(fields) = details.as_object_mut() {
            fields.insert("operation".to_string(), json!(operation.as_str()));
            fields.insert("error_kind".to_string(), json!(error.kind()));
            fields.insert("error".to_string(), json!(error.to_string()));
        }
        self.log.error(event, details);
    }
}
