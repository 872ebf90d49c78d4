use anyhow::Result;
use async_trait::async_trait;
use ondemand_common::{AddressBinding, GroupSnapshot, GroupTag, InstanceLookup, StatusCheckSummary};

/// Typed wrapper over the compute / scaling / address / parameter / notification
/// services. The core only ever talks to this trait, so tests can swap in the mock.
#[async_trait]
pub trait InfraProvider: Send + Sync {
    /// Current desired capacity and members (provider order) of a scaling group.
    async fn describe_group(&self, group_name: &str) -> Result<GroupSnapshot>;

    /// `NotFound` only for an explicit unknown-id rejection; an empty but successful
    /// answer is `NoRecord`. Any other failure is an Err and may be transient.
    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceLookup>;

    /// System + instance reachability checks. Ok(None) while the provider has no data yet.
    async fn describe_status_checks(&self, instance_id: &str) -> Result<Option<StatusCheckSummary>>;

    async fn set_desired_capacity(
        &self,
        group_name: &str,
        desired_capacity: u32,
        honor_cooldown: bool,
    ) -> Result<()>;

    async fn describe_address(&self, allocation_id: &str) -> Result<AddressBinding>;

    async fn disassociate_address(&self, association_id: &str) -> Result<()>;

    /// Returns the new association id when the provider reports one.
    async fn associate_address(
        &self,
        allocation_id: &str,
        instance_id: &str,
        allow_reassociation: bool,
    ) -> Result<Option<String>>;

    /// Create-or-overwrite a durable string parameter.
    async fn put_parameter(&self, name: &str, value: &str, overwrite: bool) -> Result<()>;

    async fn create_or_update_tags(&self, group_name: &str, tags: &[GroupTag]) -> Result<()>;

    // Optional: operator notifications.
    // Default implementation returns Ok(false) (not supported, nothing sent).
    async fn publish_notification(
        &self,
        _channel: &str,
        _subject: &str,
        _message: &str,
    ) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "aws")]
pub mod aws;
