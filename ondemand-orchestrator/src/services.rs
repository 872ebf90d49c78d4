use ondemand_providers::InfraProvider;
use std::sync::Arc;

use crate::address_binder::{AddressBinder, BindReport, WaitPolicy};
use crate::capacity_controller::{self, StartOutcome};
use crate::clock::{Clock, TokioClock};
use crate::config::Config;
use crate::error::ControlError;
use crate::notifier::Notifier;
use crate::status_reconciler::{self, StatusReport};
use crate::url_publisher::{self, PublishedUrls};

/// Process-scoped handles shared by every trigger. Holds no per-invocation
/// state; each call re-reads provider truth.
#[derive(Clone)]
pub struct Services {
    provider: Arc<dyn InfraProvider>,
    clock: Arc<dyn Clock>,
    config: Arc<Config>,
    wait_policy: WaitPolicy,
    notifier: Notifier,
}

impl Services {
    pub fn new(provider: Arc<dyn InfraProvider>, config: Config) -> Self {
        let notifier = Notifier::new(config.notification_channel.clone());
        Self {
            provider,
            clock: Arc::new(TokioClock),
            config: Arc::new(config),
            wait_policy: WaitPolicy::default(),
            notifier,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_wait_policy(mut self, wait_policy: WaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn status(&self) -> StatusReport {
        status_reconciler::get_status(self.provider.as_ref(), &self.config.group_name).await
    }

    pub async fn start(&self) -> Result<StartOutcome, ControlError> {
        capacity_controller::ensure_started(self.provider.as_ref(), &self.config.group_name).await
    }

    pub async fn bind_address(&self, instance_id: Option<&str>) -> Result<BindReport, ControlError> {
        AddressBinder::new(
            self.provider.as_ref(),
            self.clock.as_ref(),
            &self.notifier,
            self.wait_policy,
        )
        .bind_address(&self.config.allocation_id, &self.config.group_name, instance_id)
        .await
    }

    pub async fn publish_url(&self, explicit: Option<&str>) -> Result<PublishedUrls, ControlError> {
        url_publisher::publish_url(
            self.provider.as_ref(),
            &self.config.group_name,
            &self.config.parameter_name,
            explicit,
            self.config.default_url.as_deref(),
        )
        .await
    }
}
