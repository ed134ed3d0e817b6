use std::fmt;

/// Number of access key characters kept when a key is surfaced in logs.
pub const REDACTED_PREFIX_LEN: usize = 6;

/// Short-lived credentials returned by a role assumption.
///
/// Owned by a single invocation. `Debug` only ever shows the redacted access
/// key; the secret and session token are never rendered.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
}

impl TemporaryCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn redacted_access_key_id(&self) -> String {
        redact(&self.access_key_id)
    }
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.redacted_access_key_id())
            .finish_non_exhaustive()
    }
}

/// Keeps the first few characters of a secret-bearing value.
pub fn redact(value: &str) -> String {
    let prefix: String = value.chars().take(REDACTED_PREFIX_LEN).collect();
    format!("{prefix}...")
}
