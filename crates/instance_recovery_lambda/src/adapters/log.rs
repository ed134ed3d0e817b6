use serde_json::Value;
use tracing_subscriber::EnvFilter;

pub const RECOVERY_COMPONENT: &str = "recovery_handler";
const DEFAULT_LOG_FILTER: &str = "info";

/// Structured log sink the recovery handler reports every outcome through.
pub trait RecoveryLog {
    fn info(&self, event: &str, details: Value);
    fn error(&self, event: &str, details: Value);
}

/// Forwards recovery log entries to the installed `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecoveryLog;

impl RecoveryLog for TracingRecoveryLog {
    fn info(&self, event: &str, details: Value) {
        tracing::info!(component = RECOVERY_COMPONENT, event, details = %details, "{event}");
    }

    fn error(&self, event: &str, details: Value) {
        tracing::error!(component = RECOVERY_COMPONENT, event, details = %details, "{event}");
    }
}

/// Installs the process-wide JSON subscriber. Call once at cold start.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .try_init()
}
