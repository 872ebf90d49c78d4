// ============================================================================
// STATUS DERIVATION
// Maps raw provider state into the small set of user-facing states.
// ============================================================================

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::{RuntimeState, StatusCheckSummary};

/// User-facing lifecycle status. Derived on every request, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedStatus {
    Stopped,
    Pending,
    Initializing,
    Running,
    Stopping,
    NotFound,
    Error,
    /// Any other runtime state, passed through as the provider reported it.
    Other(String),
}

impl NormalizedStatus {
    pub fn as_str(&self) -> &str {
        match self {
            NormalizedStatus::Stopped => "stopped",
            NormalizedStatus::Pending => "pending",
            NormalizedStatus::Initializing => "initializing",
            NormalizedStatus::Running => "running",
            NormalizedStatus::Stopping => "stopping",
            NormalizedStatus::NotFound => "not_found",
            NormalizedStatus::Error => "error",
            NormalizedStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<&RuntimeState> for NormalizedStatus {
    fn from(state: &RuntimeState) -> Self {
        match state {
            RuntimeState::Pending => NormalizedStatus::Pending,
            RuntimeState::Running => NormalizedStatus::Running,
            RuntimeState::Stopping => NormalizedStatus::Stopping,
            RuntimeState::Stopped => NormalizedStatus::Stopped,
            other => NormalizedStatus::Other(other.as_str().to_string()),
        }
    }
}

impl fmt::Display for NormalizedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NormalizedStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusChecks {
    Passed,
    Initializing,
    NoData,
    Unknown,
}

impl StatusChecks {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusChecks::Passed => "passed",
            StatusChecks::Initializing => "initializing",
            StatusChecks::NoData => "no_data",
            StatusChecks::Unknown => "unknown",
        }
    }
}

/// Derive the user-facing status from the runtime state and (when running)
/// the provider's status checks.
///
/// Only `running` is refined: both checks ok => running/passed, checks present
/// but not both ok => initializing, no check data yet => pending/no_data.
/// Every other runtime state passes through unchanged.
pub fn derive_status(
    runtime: &RuntimeState,
    checks: Option<&StatusCheckSummary>,
) -> (NormalizedStatus, StatusChecks) {
    if *runtime != RuntimeState::Running {
        return (NormalizedStatus::from(runtime), StatusChecks::Unknown);
    }
    match checks {
        Some(c) if c.both_ok() => (NormalizedStatus::Running, StatusChecks::Passed),
        Some(_) => (NormalizedStatus::Initializing, StatusChecks::Initializing),
        None => (NormalizedStatus::Pending, StatusChecks::NoData),
    }
}

/// Fixed user-facing message table. Strings are part of the public contract.
pub fn status_message(status: &NormalizedStatus, checks: StatusChecks) -> String {
    match status {
        NormalizedStatus::Running if checks == StatusChecks::Passed => {
            "Your instance is running and ready to use!".to_string()
        }
        NormalizedStatus::Running => "Your instance is running but still initializing...".to_string(),
        NormalizedStatus::Pending => {
            "Your instance is starting up. This may take 1-2 minutes...".to_string()
        }
        NormalizedStatus::Stopping => "Your instance is shutting down.".to_string(),
        NormalizedStatus::Stopped => {
            "Your instance is currently stopped. Click the Start button to start it.".to_string()
        }
        NormalizedStatus::Initializing => {
            "Your instance is running but the services are still initializing...".to_string()
        }
        other => format!("Instance state: {}", other),
    }
}
