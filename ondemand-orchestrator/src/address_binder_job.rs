use std::time::Duration;
use tracing::{error, info, Instrument};

use crate::address_binder::BindReport;
use crate::logger;
use crate::services::Services;

/// job-address-binder: periodically makes sure the stable address points at the
/// group's current instance (scheduled mode, no waiting).
pub async fn run(services: Services, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!("[AddressBinderJob] started (every {:?})", every);

    loop {
        interval.tick().await;
        tick(&services)
            .instrument(logger::invocation_span("schedule"))
            .await;
    }
}

pub async fn tick(services: &Services) {
    match services.bind_address(None).await {
        Ok(BindReport::NothingToBind) => {}
        Ok(BindReport::Bound { instance_id, .. }) => {
            info!(instance_id = %instance_id, "[AddressBinderJob] Address bound")
        }
        Err(e) => error!(kind = e.kind(), "[AddressBinderJob] error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ondemand_common::{LifecycleState, RuntimeState};
    use ondemand_providers::mock::{MockOp, MockProvider};
    use std::sync::Arc;

    fn services(mock: Arc<MockProvider>) -> Services {
        let config = Config::from_lookup(|k| match k {
            "ASG_NAME" => Some("asg".into()),
            "EIP_ALLOCATION_ID" => Some("eipalloc-1".into()),
            "SSM_PARAM_NAME" => Some("/p".into()),
            _ => None,
        })
        .unwrap();
        Services::new(mock, config)
    }

    #[tokio::test]
    async fn tick_binds_first_member() {
        let mock = Arc::new(MockProvider::new("asg", "eipalloc-1"));
        mock.add_member("i-1", LifecycleState::InService, RuntimeState::Running);
        tick(&services(mock.clone())).await;
        assert_eq!(mock.address().bound_instance_id.as_deref(), Some("i-1"));
    }

    #[tokio::test]
    async fn failed_tick_does_not_panic() {
        let mock = Arc::new(MockProvider::new("asg", "eipalloc-1"));
        mock.fail_next(MockOp::DescribeGroup, "throttled");
        tick(&services(mock.clone())).await;
        assert!(mock.address().bound_instance_id.is_none());
    }
}
