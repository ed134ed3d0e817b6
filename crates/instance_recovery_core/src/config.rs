pub const ROLE_ARN_ENV: &str = "RECOVERY_ROLE_ARN";
pub const SESSION_NAME_ENV: &str = "RECOVERY_SESSION_NAME";
pub const DEFAULT_REGION_ENV: &str = "RECOVERY_DEFAULT_REGION";

pub const DEFAULT_SESSION_NAME: &str = "StartEC2Session";
pub const DEFAULT_FALLBACK_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// Role in the target account that is allowed to start the instance.
    pub role_arn: String,
    pub session_name: String,
    /// Region used when the event does not name one.
    pub default_region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{key} is not a valid role ARN: {value}")]
    InvalidRoleArn { key: &'static str, value: String },
}

impl RecoveryConfig {
    pub fn new(role_arn: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            default_region: DEFAULT_FALLBACK_REGION.to_string(),
        }
    }

    /// Builds the configuration from a key lookup, typically the process
    /// environment. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let role_arn = read(ROLE_ARN_ENV).ok_or(ConfigError::Missing(ROLE_ARN_ENV))?;
        if !role_arn.starts_with("arn:") {
            return Err(ConfigError::InvalidRoleArn {
                key: ROLE_ARN_ENV,
                value: role_arn,
            });
        }

        Ok(Self {
            role_arn,
            session_name: read(SESSION_NAME_ENV)
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
            default_region: read(DEFAULT_REGION_ENV)
                .unwrap_or_else(|| DEFAULT_FALLBACK_REGION.to_string()),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn applies_defaults_for_optional_values() {
        let config = RecoveryConfig::from_lookup(lookup_from(&[(
            ROLE_ARN_ENV,
            "arn:aws:iam::123456789012:role/ec2-starter",
        )]))
        .expect("config should load");

        assert_eq!(config.role_arn, "arn:aws:iam::123456789012:role/ec2-starter");
        assert_eq!(config.session_name, DEFAULT_SESSION_NAME);
        assert_eq!(config.default_region, DEFAULT_FALLBACK_REGION);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = RecoveryConfig::from_lookup(lookup_from(&[
            (ROLE_ARN_ENV, " arn:aws:iam::123456789012:role/ec2-starter "),
            (SESSION_NAME_ENV, "RecoverySession"),
            (DEFAULT_REGION_ENV, "eu-west-1"),
        ]))
        .expect("config should load");

        assert_eq!(config.role_arn, "arn:aws:iam::123456789012:role/ec2-starter");
        assert_eq!(config.session_name, "RecoverySession");
        assert_eq!(config.default_region, "eu-west-1");
    }

    #[test]
    fn blank_optional_values_use_defaults() {
        let config = RecoveryConfig::from_lookup(lookup_from(&[
            (ROLE_ARN_ENV, "arn:aws:iam::123456789012:role/ec2-starter"),
            (SESSION_NAME_ENV, ""),
            (DEFAULT_REGION_ENV, "   "),
        ]))
        .expect("config should load");

        assert_eq!(config.session_name, DEFAULT_SESSION_NAME);
        assert_eq!(config.default_region, DEFAULT_FALLBACK_REGION);
    }

    #[test]
    fn rejects_missing_role_arn() {
        let error = RecoveryConfig::from_lookup(lookup_from(&[(ROLE_ARN_ENV, " ")]))
            .expect_err("blank role arn should fail");
        assert_eq!(error, ConfigError::Missing(ROLE_ARN_ENV));
        assert_eq!(error.to_string(), "RECOVERY_ROLE_ARN must be configured");
    }

    #[test]
    fn rejects_malformed_role_arn() {
        let error = RecoveryConfig::from_lookup(lookup_from(&[(ROLE_ARN_ENV, "ec2-starter")]))
            .expect_err("role name without arn prefix should fail");
        assert!(matches!(error, ConfigError::InvalidRoleArn { .. }));
    }
}
