use ondemand_providers::InfraProvider;
use tracing::info;

use crate::error::ControlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOutcome {
    pub already_running: bool,
    /// True when this call raised desired capacity from 0 to 1.
    pub capacity_requested: bool,
}

/// Make sure exactly one instance is desired/running. Idempotent: once any member is
/// provisioning or live, repeated calls are no-ops. No retry here; the caller re-triggers.
pub async fn ensure_started(
    provider: &(impl InfraProvider + ?Sized),
    group_name: &str,
) -> Result<StartOutcome, ControlError> {
    let group = provider.describe_group(group_name).await?;

    let running = group.provisioning_or_live_count();
    if running > 0 {
        info!(
            group = group_name,
            running,
            "[CapacityController] Group already has running instances"
        );
        return Ok(StartOutcome {
            already_running: true,
            capacity_requested: false,
        });
    }

    if group.desired_capacity != 0 {
        // Group already wants an instance; it is on its way (or being replaced).
        info!(
            group = group_name,
            desired_capacity = group.desired_capacity,
            "[CapacityController] Desired capacity already set, nothing to change"
        );
        return Ok(StartOutcome {
            already_running: false,
            capacity_requested: false,
        });
    }

    info!(group = group_name, "[CapacityController] Setting desired capacity to 1");
    // Cooldown ignored so a recent scale-in does not delay the start.
    provider.set_desired_capacity(group_name, 1, false).await?;
    info!("[CapacityController] Instance start initiated successfully");

    Ok(StartOutcome {
        already_running: false,
        capacity_requested: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondemand_common::{LifecycleState, RuntimeState};
    use ondemand_providers::mock::{MockCall, MockOp, MockProvider};

    fn set_capacity_calls(p: &MockProvider) -> Vec<MockCall> {
        p.calls()
            .into_iter()
            .filter(|c| matches!(c, MockCall::SetDesiredCapacity { .. }))
            .collect()
    }

    #[tokio::test]
    async fn empty_group_at_zero_is_scaled_to_one() {
        let p = MockProvider::new("asg", "eipalloc-1");
        let outcome = ensure_started(&p, "asg").await.unwrap();
        assert!(!outcome.already_running);
        assert!(outcome.capacity_requested);
        assert_eq!(
            set_capacity_calls(&p),
            vec![MockCall::SetDesiredCapacity {
                group_name: "asg".into(),
                desired_capacity: 1,
                honor_cooldown: false,
            }]
        );
    }

    #[tokio::test]
    async fn second_call_is_a_no_op() {
        let p = MockProvider::new("asg", "eipalloc-1");
        ensure_started(&p, "asg").await.unwrap();
        let second = ensure_started(&p, "asg").await.unwrap();
        assert!(second.already_running);
        assert_eq!(set_capacity_calls(&p).len(), 1);
    }

    #[tokio::test]
    async fn every_provisioning_state_counts_as_running() {
        for state in [
            LifecycleState::InService,
            LifecycleState::Pending,
            LifecycleState::PendingWait,
            LifecycleState::PendingProceed,
        ] {
            let p = MockProvider::new("asg", "eipalloc-1");
            p.set_desired(1);
            p.add_member("i-1", state.clone(), RuntimeState::Pending);
            let outcome = ensure_started(&p, "asg").await.unwrap();
            assert!(outcome.already_running, "{state}");
            assert!(p.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn terminating_member_does_not_count() {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.add_member("i-old", LifecycleState::Terminating, RuntimeState::ShuttingDown);
        let outcome = ensure_started(&p, "asg").await.unwrap();
        assert!(!outcome.already_running);
        assert!(outcome.capacity_requested);
    }

    #[tokio::test]
    async fn nonzero_desired_capacity_is_left_alone() {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.set_desired(1);
        let outcome = ensure_started(&p, "asg").await.unwrap();
        assert!(!outcome.already_running);
        assert!(!outcome.capacity_requested);
        assert!(p.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.fail_next(MockOp::SetDesiredCapacity, "throttled");
        let err = ensure_started(&p, "asg").await.unwrap_err();
        assert!(matches!(err, ControlError::ProviderUnavailable(_)));
    }
}
