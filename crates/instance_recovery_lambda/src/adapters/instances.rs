use instance_recovery_core::credentials::TemporaryCredentials;
use instance_recovery_core::remote::{RemoteCallError, RemoteInstanceSet, StartInstancesResponse};

/// Instance operations performed in the target account under borrowed
/// credentials.
pub trait InstanceGateway {
    fn describe_instance_ids(
        &self,
        credentials: &TemporaryCredentials,
        region: &str,
    ) -> Result<RemoteInstanceSet, RemoteCallError>;

    fn start_instances(
        &self,
        credentials: &TemporaryCredentials,
        region: &str,
        instance_ids: &[String],
    ) -> Result<StartInstancesResponse, RemoteCallError>;
}
