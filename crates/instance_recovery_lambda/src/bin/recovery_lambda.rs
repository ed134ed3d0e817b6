use std::future::Future;

use aws_sdk_ec2::config::{Credentials, Region};
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use instance_recovery_core::config::RecoveryConfig;
use instance_recovery_core::credentials::TemporaryCredentials;
use instance_recovery_core::remote::{
    classify_service_error, InstanceStateChange, RemoteCallError, RemoteInstanceSet,
    RemoteOperation, StartInstancesResponse,
};
use instance_recovery_lambda::adapters::instances::InstanceGateway;
use instance_recovery_lambda::adapters::log::{init_tracing, TracingRecoveryLog};
use instance_recovery_lambda::adapters::role::RoleAssumer;
use instance_recovery_lambda::handlers::recovery::RecoveryHandler;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

const ASSUMED_ROLE_PROVIDER: &str = "recovery-assumed-role";

struct StsRoleAssumer {
    sts_client: aws_sdk_sts::Client,
}

impl RoleAssumer for StsRoleAssumer {
    fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, RemoteCallError> {
        let client = self.sts_client.clone();
        let role_arn = role_arn.to_string();
        let session_name = session_name.to_string();

        block_on(async move {
            let output = client
                .assume_role()
                .role_arn(role_arn)
                .role_session_name(session_name)
                .send()
                .await
                .map_err(|error| classify_sdk_error(RemoteOperation::AssumeRole, &error))?;

            let credentials = output.credentials().ok_or_else(|| {
                RemoteCallError::Service(
                    "AssumeRole response did not include credentials".to_string(),
                )
            })?;

            Ok(TemporaryCredentials::new(
                credentials.access_key_id(),
                credentials.secret_access_key(),
                credentials.session_token(),
            ))
        })
    }
}

struct Ec2InstanceGateway {
    sdk_config: aws_config::SdkConfig,
}

impl Ec2InstanceGateway {
    fn client_for(&self, credentials: &TemporaryCredentials, region: &str) -> aws_sdk_ec2::Client {
        let config = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                credentials.access_key_id(),
                credentials.secret_access_key(),
                Some(credentials.session_token().to_string()),
                None,
                ASSUMED_ROLE_PROVIDER,
            ))
            .build();
        aws_sdk_ec2::Client::from_conf(config)
    }
}

impl InstanceGateway for Ec2InstanceGateway {
    fn describe_instance_ids(
        &self,
        credentials: &TemporaryCredentials,
        region: &str,
    ) -> Result<RemoteInstanceSet, RemoteCallError> {
        let client = self.client_for(credentials, region);

        block_on(async move {
            let mut instance_ids = Vec::new();
            let mut next_token: Option<String> = None;
            loop {
                let response = client
                    .describe_instances()
                    .set_next_token(next_token.take())
                    .send()
                    .await
                    .map_err(|error| {
                        classify_sdk_error(RemoteOperation::DescribeInstances, &error)
                    })?;

                for reservation in response.reservations() {
                    for instance in reservation.instances() {
                        if let Some(instance_id) = instance.instance_id() {
                            instance_ids.push(instance_id.to_string());
                        }
                    }
                }

                match response.next_token() {
                    Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                    _ => break,
                }
            }
            Ok(RemoteInstanceSet::new(instance_ids))
        })
    }

    fn start_instances(
        &self,
        credentials: &TemporaryCredentials,
        region: &str,
        instance_ids: &[String],
    ) -> Result<StartInstancesResponse, RemoteCallError> {
        let client = self.client_for(credentials, region);
        let instance_ids = instance_ids.to_vec();

        block_on(async move {
            let response = client
                .start_instances()
                .set_instance_ids(Some(instance_ids))
                .send()
                .await
                .map_err(|error| classify_sdk_error(RemoteOperation::StartInstances, &error))?;

            let starting_instances = response
                .starting_instances()
                .iter()
                .map(|change| InstanceStateChange {
                    instance_id: change.instance_id().unwrap_or_default().to_string(),
                    previous_state: change
                        .previous_state()
                        .and_then(|state| state.name())
                        .map(|name| name.as_str().to_string()),
                    current_state: change
                        .current_state()
                        .and_then(|state| state.name())
                        .map(|name| name.as_str().to_string()),
                })
                .collect();

            Ok(StartInstancesResponse { starting_instances })
        })
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

fn classify_sdk_error<E, R>(operation: RemoteOperation, error: &SdkError<E, R>) -> RemoteCallError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{} failed: {}", operation.as_str(), DisplayErrorContext(error));
    match error {
        SdkError::ServiceError(context) => {
            classify_service_error(operation, context.err().code(), message)
        }
        _ => RemoteCallError::Transport(message),
    }
}

struct RuntimeDependencies {
    config: RecoveryConfig,
    role_assumer: StsRoleAssumer,
    instances: Ec2InstanceGateway,
    log: TracingRecoveryLog,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<(), Error> {
    let handler = RecoveryHandler::new(
        &deps.config,
        &deps.role_assumer,
        &deps.instances,
        &deps.log,
    );
    let outcome = handler.handle(&event.payload);
    tracing::debug!(request_id = %event.context.request_id, ?outcome, "invocation finished");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing()?;
    let config = RecoveryConfig::from_env()?;

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config,
        role_assumer: StsRoleAssumer {
            sts_client: aws_sdk_sts::Client::new(&sdk_config),
        },
        instances: Ec2InstanceGateway { sdk_config },
        log: TracingRecoveryLog,
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps).await
    }))
    .await
}

#[cfg(test)]
mod tests {
    use aws_sdk_ec2::error::ErrorMetadata;
    use aws_sdk_ec2::operation::describe_instances::DescribeInstancesError;
    use aws_sdk_ec2::operation::start_instances::StartInstancesError;
    use aws_sdk_sts::operation::assume_role::AssumeRoleError;

    use super::*;

    fn metadata(code: &str, message: &str) -> ErrorMetadata {
        ErrorMetadata::builder().code(code).message(message).build()
    }

    #[test]
    fn timeouts_are_transport_errors() {
        let error: SdkError<StartInstancesError, ()> =
            SdkError::timeout_error("operation timed out");

        let classified = classify_sdk_error(RemoteOperation::StartInstances, &error);

        assert_eq!(classified.kind(), "transport");
        assert!(classified.message().starts_with("StartInstances failed:"));
    }

    #[test]
    fn unauthorized_describe_is_a_permission_error() {
        let error: SdkError<DescribeInstancesError, ()> = SdkError::service_error(
            DescribeInstancesError::generic(metadata(
                "UnauthorizedOperation",
                "You are not authorized to perform this operation.",
            )),
            (),
        );

        let classified = classify_sdk_error(RemoteOperation::DescribeInstances, &error);

        assert_eq!(classified.kind(), "permission");
        assert!(classified.message().starts_with("DescribeInstances failed:"));
    }

    #[test]
    fn incorrect_instance_state_is_an_invalid_state_error() {
        let error: SdkError<StartInstancesError, ()> = SdkError::service_error(
            StartInstancesError::generic(metadata(
                "IncorrectInstanceState",
                "The instance 'i-0123' is not in a state from which it can be started.",
            )),
            (),
        );

        let classified = classify_sdk_error(RemoteOperation::StartInstances, &error);

        assert_eq!(classified.kind(), "invalid_state");
        assert!(classified.message().starts_with("StartInstances failed:"));
    }

    #[test]
    fn assume_role_rejection_is_an_authorization_error() {
        let error: SdkError<AssumeRoleError, ()> = SdkError::service_error(
            AssumeRoleError::generic(metadata(
                "AccessDenied",
                "User is not authorized to perform: sts:AssumeRole",
            )),
            (),
        );

        let classified = classify_sdk_error(RemoteOperation::AssumeRole, &error);

        assert_eq!(classified.kind(), "authorization");
        assert!(classified.message().starts_with("AssumeRole failed:"));
    }

    #[test]
    fn assume_role_timeout_stays_a_transport_error() {
        let error: SdkError<AssumeRoleError, ()> = SdkError::timeout_error("connect timeout");

        let classified = classify_sdk_error(RemoteOperation::AssumeRole, &error);

        assert_eq!(classified.kind(), "transport");
    }
}
