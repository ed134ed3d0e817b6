use instance_recovery_core::credentials::TemporaryCredentials;
use instance_recovery_core::remote::RemoteCallError;

pub trait RoleAssumer {
    fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, RemoteCallError>;
}
