// ============================================================================
// ADDRESS BINDER
// Waits for an instance to be running, then (re)associates the stable address.
// ============================================================================

use ondemand_common::{InstanceLookup, RuntimeState};
use ondemand_providers::InfraProvider;
use std::time::Duration;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::ControlError;
use crate::notifier::Notifier;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_READY_GRACE: Duration = Duration::from_secs(5);

/// Bounds of the readiness wait (30 x 10s, about 5 minutes, plus 5s grace).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    /// Extra wait after first observing `running`, to absorb provider-side
    /// consistency lag right after boot.
    pub ready_grace: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            ready_grace: DEFAULT_READY_GRACE,
        }
    }
}

/// What a single poll observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    State(RuntimeState),
    /// Provider says the instance id does not exist. Fatal, never retried.
    NotFound,
    /// Any other fetch failure, or a successful answer with no record yet.
    /// Counts as a normal attempt.
    TransientError,
}

/// Readiness wait state machine: `Waiting -> Ready | Dead | TimedOut`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitState {
    Waiting { attempt: u32 },
    Ready { attempts: u32 },
    /// `state` is None when the instance vanished (not found).
    Dead { state: Option<RuntimeState> },
    TimedOut { attempts: u32 },
}

impl WaitState {
    /// Transition after poll number `attempt` (1-based).
    pub fn after_poll(attempt: u32, outcome: &PollOutcome, max_attempts: u32) -> WaitState {
        match outcome {
            PollOutcome::State(RuntimeState::Running) => WaitState::Ready { attempts: attempt },
            PollOutcome::State(s) if s.is_gone() => WaitState::Dead {
                state: Some(s.clone()),
            },
            PollOutcome::NotFound => WaitState::Dead { state: None },
            _ if attempt >= max_attempts => WaitState::TimedOut { attempts: attempt },
            _ => WaitState::Waiting { attempt },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// Allocation was already bound to the target; no calls issued.
    AlreadyBound,
    Associated {
        previous_instance_id: Option<String>,
        association_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindReport {
    /// Scheduled mode found no group member; nothing to bind yet.
    NothingToBind,
    Bound {
        instance_id: String,
        outcome: BindOutcome,
    },
}

pub struct AddressBinder<'a, P: InfraProvider + ?Sized> {
    provider: &'a P,
    clock: &'a dyn Clock,
    notifier: &'a Notifier,
    policy: WaitPolicy,
}

impl<'a, P: InfraProvider + ?Sized> AddressBinder<'a, P> {
    pub fn new(provider: &'a P, clock: &'a dyn Clock, notifier: &'a Notifier, policy: WaitPolicy) -> Self {
        Self {
            provider,
            clock,
            notifier,
            policy,
        }
    }

    /// Entry point for both trigger modes.
    ///
    /// With an instance id (lifecycle event) the instance is first waited on; without
    /// one (scheduled tick) the group's target member is bound directly, or nothing
    /// happens when the group is empty. Any failure is reported to the operator
    /// channel on a best-effort basis and then returned unchanged.
    pub async fn bind_address(
        &self,
        allocation_id: &str,
        group_name: &str,
        instance_id: Option<&str>,
    ) -> Result<BindReport, ControlError> {
        let instance_id = match instance_id {
            Some(id) => {
                info!(allocation_id, instance_id = id, "[AddressBinder] Associating address with instance");
                if let Err(e) = self.wait_for_running(id).await {
                    self.report_failure(id, &e).await;
                    return Err(e);
                }
                id.to_string()
            }
            None => match self.resolve_target(group_name).await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    info!(group = group_name, "[AddressBinder] No instances found in group");
                    return Ok(BindReport::NothingToBind);
                }
                Err(e) => {
                    self.report_failure("unknown", &e).await;
                    return Err(e);
                }
            },
        };

        match self.associate(allocation_id, &instance_id).await {
            Ok(outcome) => Ok(BindReport::Bound {
                instance_id,
                outcome,
            }),
            Err(e) => {
                self.report_failure(&instance_id, &e).await;
                Err(e)
            }
        }
    }

    async fn resolve_target(&self, group_name: &str) -> Result<Option<String>, ControlError> {
        let group = self.provider.describe_group(group_name).await?;
        Ok(group.target_member().map(|m| m.instance_id.clone()))
    }

    /// Poll until the instance is running. Returns the number of polls consumed.
    pub async fn wait_for_running(&self, instance_id: &str) -> Result<u32, ControlError> {
        info!(instance_id, "[AddressBinder] Waiting for instance to be running...");
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match self.provider.describe_instance(instance_id).await {
                Ok(InstanceLookup::Found(snapshot)) => {
                    info!(instance_id, attempt, "[AddressBinder] Instance state: {}", snapshot.runtime_state);
                    PollOutcome::State(snapshot.runtime_state)
                }
                Ok(InstanceLookup::NotFound) => PollOutcome::NotFound,
                Ok(InstanceLookup::NoRecord) => {
                    warn!(instance_id, attempt, "[AddressBinder] Instance not visible yet");
                    PollOutcome::TransientError
                }
                Err(e) => {
                    warn!(instance_id, attempt, "[AddressBinder] Error checking instance state: {:#}", e);
                    PollOutcome::TransientError
                }
            };

            match WaitState::after_poll(attempt, &outcome, self.policy.max_attempts) {
                WaitState::Waiting { .. } => self.clock.sleep(self.policy.poll_interval).await,
                WaitState::Ready { attempts } => {
                    self.clock.sleep(self.policy.ready_grace).await;
                    return Ok(attempts);
                }
                WaitState::Dead { state: Some(state) } => {
                    return Err(ControlError::InstanceUnavailable {
                        instance_id: instance_id.to_string(),
                        state,
                    })
                }
                WaitState::Dead { state: None } => {
                    return Err(ControlError::NotFound(format!("instance {}", instance_id)))
                }
                WaitState::TimedOut { attempts } => {
                    return Err(ControlError::WaitTimeout {
                        instance_id: instance_id.to_string(),
                        attempts,
                    })
                }
            }
        }
    }

    /// Check-before-associate. Any existing association elsewhere is removed first.
    pub async fn associate(&self, allocation_id: &str, instance_id: &str) -> Result<BindOutcome, ControlError> {
        let binding = self.provider.describe_address(allocation_id).await?;
        if binding.bound_instance_id.as_deref() == Some(instance_id) {
            info!(allocation_id, instance_id, "[AddressBinder] Address is already associated with instance");
            return Ok(BindOutcome::AlreadyBound);
        }

        let mut previous_instance_id = None;
        if let Some(association_id) = binding.association_id.as_deref() {
            info!(
                allocation_id,
                previous_instance_id = ?binding.bound_instance_id,
                "[AddressBinder] Disassociating address from previous instance"
            );
            self.provider.disassociate_address(association_id).await?;
            previous_instance_id = binding.bound_instance_id.clone();
        }

        // Reassociation allowed: the provider's own bookkeeping may still show the old owner.
        let association_id = self
            .provider
            .associate_address(allocation_id, instance_id, true)
            .await?;
        info!(
            allocation_id,
            instance_id,
            public_ip = ?binding.public_ip,
            association_id = ?association_id,
            "[AddressBinder] ✅ Associated address with instance"
        );
        Ok(BindOutcome::Associated {
            previous_instance_id,
            association_id,
        })
    }

    async fn report_failure(&self, instance_id: &str, e: &ControlError) {
        warn!(instance_id, kind = e.kind(), "[AddressBinder] ❌ Address association failed: {}", e);
        self.notifier
            .notify_bind_failure(self.provider, instance_id, &e.to_string())
            .await;
    }
}
