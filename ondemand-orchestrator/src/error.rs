use ondemand_common::RuntimeState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    /// Transient infrastructure call failure.
    #[error("infrastructure provider call failed: {0:#}")]
    ProviderUnavailable(#[from] anyhow::Error),

    #[error("instance {instance_id} is {state}, cannot proceed with address association")]
    InstanceUnavailable {
        instance_id: String,
        state: RuntimeState,
    },

    #[error("timed out waiting for instance {instance_id} to be running ({attempts} attempts)")]
    WaitTimeout { instance_id: String, attempts: u32 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("missing configuration: {0}")]
    MissingConfiguration(&'static str),
}

impl ControlError {
    pub fn kind(&self) -> &'static str {
        match self {
            ControlError::ProviderUnavailable(_) => "provider_unavailable",
            ControlError::InstanceUnavailable { .. } => "instance_unavailable",
            ControlError::WaitTimeout { .. } => "wait_timeout",
            ControlError::NotFound(_) => "not_found",
            ControlError::MissingConfiguration(_) => "missing_configuration",
        }
    }
}
