use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod events;
pub mod status;

pub use events::{LifecycleDetail, LifecycleEvent};
pub use status::{derive_status, status_message, NormalizedStatus, StatusChecks};

// -----------------------------------------------------------------------------
// Tags written onto the scaling group (propagated to future members)
// -----------------------------------------------------------------------------

pub const TAG_API_URL: &str = "ApiGatewayUrl";
pub const TAG_API_START_URL: &str = "ApiGatewayStartUrl";
pub const TAG_API_STATUS_URL: &str = "ApiGatewayStatusUrl";

// --- Enums ---

/// The instance's own state machine, as reported by the compute provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuntimeState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Unknown(String),
}

impl RuntimeState {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => RuntimeState::Pending,
            "running" => RuntimeState::Running,
            "shutting-down" => RuntimeState::ShuttingDown,
            "terminated" => RuntimeState::Terminated,
            "stopping" => RuntimeState::Stopping,
            "stopped" => RuntimeState::Stopped,
            _ => RuntimeState::Unknown(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RuntimeState::Pending => "pending",
            RuntimeState::Running => "running",
            RuntimeState::ShuttingDown => "shutting-down",
            RuntimeState::Terminated => "terminated",
            RuntimeState::Stopping => "stopping",
            RuntimeState::Stopped => "stopped",
            RuntimeState::Unknown(s) => s.as_str(),
        }
    }

    /// States an instance never comes back from.
    pub fn is_gone(&self) -> bool {
        matches!(self, RuntimeState::Terminated | RuntimeState::ShuttingDown)
    }
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scaling-group member state. Distinct from [`RuntimeState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Pending,
    PendingWait,
    PendingProceed,
    InService,
    Standby,
    Terminating,
    TerminatingWait,
    TerminatingProceed,
    Terminated,
    Other(String),
}

impl LifecycleState {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Pending" => LifecycleState::Pending,
            "Pending:Wait" => LifecycleState::PendingWait,
            "Pending:Proceed" => LifecycleState::PendingProceed,
            "InService" => LifecycleState::InService,
            "Standby" => LifecycleState::Standby,
            "Terminating" => LifecycleState::Terminating,
            "Terminating:Wait" => LifecycleState::TerminatingWait,
            "Terminating:Proceed" => LifecycleState::TerminatingProceed,
            "Terminated" => LifecycleState::Terminated,
            other => LifecycleState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LifecycleState::Pending => "Pending",
            LifecycleState::PendingWait => "Pending:Wait",
            LifecycleState::PendingProceed => "Pending:Proceed",
            LifecycleState::InService => "InService",
            LifecycleState::Standby => "Standby",
            LifecycleState::Terminating => "Terminating",
            LifecycleState::TerminatingWait => "Terminating:Wait",
            LifecycleState::TerminatingProceed => "Terminating:Proceed",
            LifecycleState::Terminated => "Terminated",
            LifecycleState::Other(s) => s.as_str(),
        }
    }

    /// True when the member is live or already being provisioned.
    /// Anything on its way out (Terminating, Standby, ...) does not count.
    pub fn is_provisioning_or_live(&self) -> bool {
        matches!(
            self,
            LifecycleState::InService
                | LifecycleState::Pending
                | LifecycleState::PendingWait
                | LifecycleState::PendingProceed
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one provider health check (system or instance reachability).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Initializing,
    Impaired,
    InsufficientData,
    Other(String),
}

impl CheckStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "ok" => CheckStatus::Ok,
            "initializing" => CheckStatus::Initializing,
            "impaired" => CheckStatus::Impaired,
            "insufficient-data" => CheckStatus::InsufficientData,
            other => CheckStatus::Other(other.to_string()),
        }
    }
}

// --- Snapshots (read fresh per invocation, never persisted) ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCheckSummary {
    pub system: CheckStatus,
    pub instance: CheckStatus,
}

impl StatusCheckSummary {
    pub fn new(system: CheckStatus, instance: CheckStatus) -> Self {
        Self { system, instance }
    }

    pub fn both_ok(&self) -> bool {
        self.system == CheckStatus::Ok && self.instance == CheckStatus::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSnapshot {
    pub instance_id: String,
    pub runtime_state: RuntimeState,
    pub public_ip: Option<String>,
    pub launch_time: Option<DateTime<Utc>>,
}

/// Result of looking an instance up by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceLookup {
    Found(InstanceSnapshot),
    /// The provider explicitly rejected the id as unknown.
    NotFound,
    /// The call succeeded but returned no record (e.g. not yet visible after launch).
    NoRecord,
}

impl InstanceLookup {
    pub fn into_snapshot(self) -> Option<InstanceSnapshot> {
        match self {
            InstanceLookup::Found(snapshot) => Some(snapshot),
            InstanceLookup::NotFound | InstanceLookup::NoRecord => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub instance_id: String,
    pub lifecycle_state: LifecycleState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub name: String,
    pub desired_capacity: u32,
    /// Provider order, preserved.
    pub members: Vec<GroupMember>,
}

impl GroupSnapshot {
    /// Target selection policy: index 0 of the provider-returned member order.
    ///
    /// The system manages a single instance. If the group ever reports several
    /// members, only the first is treated as authoritative; behaviour with truly
    /// concurrent instances is not defined beyond that.
    pub fn target_member(&self) -> Option<&GroupMember> {
        self.members.first()
    }

    pub fn provisioning_or_live_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.lifecycle_state.is_provisioning_or_live())
            .count()
    }
}

/// Provider-side truth about a stable public address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressBinding {
    pub allocation_id: String,
    pub public_ip: Option<String>,
    pub bound_instance_id: Option<String>,
    pub association_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTag {
    pub key: String,
    pub value: String,
    pub propagate_at_launch: bool,
}

impl GroupTag {
    pub fn propagated(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
            propagate_at_launch: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, state: &str) -> GroupMember {
        GroupMember {
            instance_id: id.to_string(),
            lifecycle_state: LifecycleState::parse(state),
        }
    }

    #[test]
    fn runtime_state_parse_roundtrip() {
        for s in ["pending", "running", "shutting-down", "terminated", "stopping", "stopped"] {
            assert_eq!(RuntimeState::parse(s).as_str(), s);
        }
        assert_eq!(
            RuntimeState::parse("rebooting"),
            RuntimeState::Unknown("rebooting".to_string())
        );
        assert!(RuntimeState::Terminated.is_gone());
        assert!(RuntimeState::ShuttingDown.is_gone());
        assert!(!RuntimeState::Stopped.is_gone());
    }

    #[test]
    fn lifecycle_states_that_count_as_running() {
        for s in ["InService", "Pending", "Pending:Wait", "Pending:Proceed"] {
            assert!(LifecycleState::parse(s).is_provisioning_or_live(), "{s}");
        }
        for s in ["Terminating", "Terminating:Wait", "Terminated", "Standby", "Detaching"] {
            assert!(!LifecycleState::parse(s).is_provisioning_or_live(), "{s}");
        }
        assert_eq!(LifecycleState::parse("Detaching").as_str(), "Detaching");
    }

    #[test]
    fn target_member_is_first_in_provider_order() {
        let group = GroupSnapshot {
            name: "asg".into(),
            desired_capacity: 2,
            members: vec![member("i-b", "Terminating"), member("i-a", "InService")],
        };
        assert_eq!(group.target_member().unwrap().instance_id, "i-b");
        assert_eq!(group.provisioning_or_live_count(), 1);

        let empty = GroupSnapshot {
            name: "asg".into(),
            desired_capacity: 0,
            members: vec![],
        };
        assert!(empty.target_member().is_none());
    }

    #[test]
    fn check_summary_requires_both_ok() {
        assert!(StatusCheckSummary::new(CheckStatus::Ok, CheckStatus::Ok).both_ok());
        assert!(!StatusCheckSummary::new(CheckStatus::Ok, CheckStatus::parse("initializing")).both_ok());
        assert!(!StatusCheckSummary::new(CheckStatus::Impaired, CheckStatus::Ok).both_ok());
    }
}
