use chrono::{DateTime, Utc};
use ondemand_common::{derive_status, status_message, NormalizedStatus, RuntimeState, StatusChecks};
use ondemand_providers::InfraProvider;
use tracing::{debug, error, info};

use crate::error::ControlError;

pub const NO_INSTANCES_MESSAGE: &str = "No instances are currently running";
pub const NOT_FOUND_MESSAGE: &str = "Instance not found";
pub const ERROR_MESSAGE: &str = "Failed to check instance status. Please try again later.";

/// What callers get back from a status check.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub status: NormalizedStatus,
    pub instance_id: Option<String>,
    pub public_ip: Option<String>,
    pub status_checks: StatusChecks,
    pub launch_time: Option<DateTime<Utc>>,
    pub message: String,
}

impl StatusReport {
    fn bare(status: NormalizedStatus, message: &str) -> Self {
        Self {
            status,
            instance_id: None,
            public_ip: None,
            status_checks: StatusChecks::Unknown,
            launch_time: None,
            message: message.to_string(),
        }
    }

    pub fn stopped() -> Self {
        Self::bare(NormalizedStatus::Stopped, NO_INSTANCES_MESSAGE)
    }

    pub fn not_found(instance_id: &str) -> Self {
        Self {
            instance_id: Some(instance_id.to_string()),
            ..Self::bare(NormalizedStatus::NotFound, NOT_FOUND_MESSAGE)
        }
    }

    /// Opaque failure report. Never carries provider error text.
    pub fn error() -> Self {
        Self::bare(NormalizedStatus::Error, ERROR_MESSAGE)
    }

    pub fn is_error(&self) -> bool {
        self.status == NormalizedStatus::Error
    }
}

/// Read-only: derive the normalized status of the group's target instance.
pub async fn reconcile_status(
    provider: &(impl InfraProvider + ?Sized),
    group_name: &str,
) -> Result<StatusReport, ControlError> {
    let group = provider.describe_group(group_name).await?;

    let Some(target) = group.target_member() else {
        info!(group = group_name, "[StatusReconciler] Group has no instances");
        return Ok(StatusReport::stopped());
    };
    if group.members.len() > 1 {
        debug!(
            group = group_name,
            members = group.members.len(),
            instance_id = %target.instance_id,
            "[StatusReconciler] Several members reported, using the first"
        );
    }

    // An explicit unknown id and an empty answer both mean there is nothing to report on.
    let Some(instance) = provider
        .describe_instance(&target.instance_id)
        .await?
        .into_snapshot()
    else {
        info!(group = group_name, instance_id = %target.instance_id, "[StatusReconciler] Instance not found");
        return Ok(StatusReport::not_found(&target.instance_id));
    };

    // Status checks only matter once the instance itself reports running.
    let checks = if instance.runtime_state == RuntimeState::Running {
        provider.describe_status_checks(&instance.instance_id).await?
    } else {
        None
    };

    let (status, status_checks) = derive_status(&instance.runtime_state, checks.as_ref());
    let message = status_message(&status, status_checks);
    info!(
        group = group_name,
        instance_id = %instance.instance_id,
        "[StatusReconciler] runtime={} -> status={} checks={}",
        instance.runtime_state,
        status,
        status_checks.as_str()
    );

    Ok(StatusReport {
        status,
        instance_id: Some(instance.instance_id),
        public_ip: instance.public_ip,
        status_checks,
        launch_time: instance.launch_time,
        message,
    })
}

/// Same as [`reconcile_status`], but provider failures become an `error`
/// report. The detail is logged here and nowhere else.
pub async fn get_status(provider: &(impl InfraProvider + ?Sized), group_name: &str) -> StatusReport {
    match reconcile_status(provider, group_name).await {
        Ok(report) => report,
        Err(e) => {
            error!(kind = e.kind(), "[StatusReconciler] Error checking instance status: {}", e);
            StatusReport::error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondemand_common::{CheckStatus, LifecycleState, StatusCheckSummary};
    use ondemand_providers::mock::{MockOp, MockProvider};

    fn provider_with(runtime: RuntimeState) -> MockProvider {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.set_desired(1);
        p.add_member("i-1", LifecycleState::InService, runtime);
        p
    }

    #[tokio::test]
    async fn empty_group_is_stopped_not_error() {
        let p = MockProvider::new("asg", "eipalloc-1");
        let report = get_status(&p, "asg").await;
        assert_eq!(report.status, NormalizedStatus::Stopped);
        assert_eq!(report.message, NO_INSTANCES_MESSAGE);
        assert!(report.instance_id.is_none());
    }

    #[tokio::test]
    async fn running_and_checks_passed() {
        let p = provider_with(RuntimeState::Running);
        p.set_public_ip("i-1", "198.51.100.7");
        p.set_checks("i-1", Some(StatusCheckSummary::new(CheckStatus::Ok, CheckStatus::Ok)));

        let report = get_status(&p, "asg").await;
        assert_eq!(report.status, NormalizedStatus::Running);
        assert_eq!(report.status_checks, StatusChecks::Passed);
        assert_eq!(report.instance_id.as_deref(), Some("i-1"));
        assert_eq!(report.public_ip.as_deref(), Some("198.51.100.7"));
        assert_eq!(report.message, "Your instance is running and ready to use!");
    }

    #[tokio::test]
    async fn running_with_impaired_check_is_initializing() {
        let p = provider_with(RuntimeState::Running);
        p.set_checks(
            "i-1",
            Some(StatusCheckSummary::new(CheckStatus::Ok, CheckStatus::Initializing)),
        );
        let report = get_status(&p, "asg").await;
        assert_eq!(report.status, NormalizedStatus::Initializing);
        assert_eq!(report.status_checks, StatusChecks::Initializing);
    }

    #[tokio::test]
    async fn running_without_check_data_is_pending() {
        let p = provider_with(RuntimeState::Running);
        let report = get_status(&p, "asg").await;
        assert_eq!(report.status, NormalizedStatus::Pending);
        assert_eq!(report.status_checks, StatusChecks::NoData);
    }

    #[tokio::test]
    async fn stopping_passes_through_without_fetching_checks() {
        let p = provider_with(RuntimeState::Stopping);
        p.fail_next(MockOp::DescribeStatusChecks, "must not be called");
        let report = get_status(&p, "asg").await;
        assert_eq!(report.status, NormalizedStatus::Stopping);
        assert_eq!(report.message, "Your instance is shutting down.");
    }

    #[tokio::test]
    async fn unresolvable_instance_is_not_found() {
        let p = provider_with(RuntimeState::Running);
        p.forget_instance("i-1");
        let report = get_status(&p, "asg").await;
        assert_eq!(report.status, NormalizedStatus::NotFound);
        assert_eq!(report.instance_id.as_deref(), Some("i-1"));
    }

    #[tokio::test]
    async fn empty_describe_answer_is_not_found() {
        let p = provider_with(RuntimeState::Pending);
        p.hide_instance("i-1", 1);
        let report = get_status(&p, "asg").await;
        assert_eq!(report.status, NormalizedStatus::NotFound);
        assert_eq!(report.message, NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn provider_failure_is_opaque_error() {
        let p = provider_with(RuntimeState::Running);
        p.fail_next(MockOp::DescribeGroup, "AccessDenied: secret detail");
        let report = get_status(&p, "asg").await;
        assert!(report.is_error());
        assert_eq!(report.message, ERROR_MESSAGE);
        assert!(!report.message.contains("secret"));
    }

    #[tokio::test]
    async fn first_member_is_authoritative() {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.add_member("i-first", LifecycleState::InService, RuntimeState::Stopped);
        p.add_member("i-second", LifecycleState::InService, RuntimeState::Running);
        let report = get_status(&p, "asg").await;
        assert_eq!(report.instance_id.as_deref(), Some("i-first"));
        assert_eq!(report.status, NormalizedStatus::Stopped);
    }
}
