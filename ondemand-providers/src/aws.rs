use crate::InfraProvider;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_autoscaling::types::Tag;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ssm::types::ParameterType;
use ondemand_common::{
    AddressBinding, CheckStatus, GroupMember, GroupSnapshot, GroupTag, InstanceLookup,
    InstanceSnapshot, LifecycleState, RuntimeState, StatusCheckSummary,
};
use tracing::{debug, info};

const INSTANCE_NOT_FOUND: &str = "InvalidInstanceID.NotFound";
const GROUP_RESOURCE_TYPE: &str = "auto-scaling-group";

/// Some SDK accessors are optional and some are not, depending on how the shape
/// marks the member. Normalise both to Option.
fn opt<'a, T: ?Sized + 'a>(v: impl Into<Option<&'a T>>) -> Option<&'a T> {
    v.into()
}

pub struct AwsProvider {
    ec2: aws_sdk_ec2::Client,
    autoscaling: aws_sdk_autoscaling::Client,
    ssm: aws_sdk_ssm::Client,
    sns: aws_sdk_sns::Client,
}

impl AwsProvider {
    /// Region and credentials come from the standard environment / profile chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            ec2: aws_sdk_ec2::Client::new(&config),
            autoscaling: aws_sdk_autoscaling::Client::new(&config),
            ssm: aws_sdk_ssm::Client::new(&config),
            sns: aws_sdk_sns::Client::new(&config),
        }
    }
}

#[async_trait]
impl InfraProvider for AwsProvider {
    async fn describe_group(&self, group_name: &str) -> Result<GroupSnapshot> {
        debug!("[AWS API] DescribeAutoScalingGroups {}", group_name);
        let out = self
            .autoscaling
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(group_name)
            .send()
            .await
            .map_err(|e| anyhow!("DescribeAutoScalingGroups failed: {}", DisplayErrorContext(&e)))?;

        let group = out
            .auto_scaling_groups()
            .first()
            .ok_or_else(|| anyhow!("auto scaling group {} not found", group_name))?;

        let members = group
            .instances()
            .iter()
            .filter_map(|i| {
                let instance_id = opt::<str>(i.instance_id())?;
                let lifecycle = opt::<aws_sdk_autoscaling::types::LifecycleState>(i.lifecycle_state())
                    .map(|s| LifecycleState::parse(s.as_str()))
                    .unwrap_or_else(|| LifecycleState::Other("unknown".to_string()));
                Some(GroupMember {
                    instance_id: instance_id.to_string(),
                    lifecycle_state: lifecycle,
                })
            })
            .collect();

        let desired: Option<i32> = group.desired_capacity().into();
        Ok(GroupSnapshot {
            name: group_name.to_string(),
            desired_capacity: desired.unwrap_or(0).max(0) as u32,
            members,
        })
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceLookup> {
        debug!("[AWS API] DescribeInstances {}", instance_id);
        let out = match self
            .ec2
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
        {
            Ok(out) => out,
            Err(e) if e.code() == Some(INSTANCE_NOT_FOUND) => return Ok(InstanceLookup::NotFound),
            Err(e) => {
                return Err(anyhow!(
                    "DescribeInstances {} failed: {}",
                    instance_id,
                    DisplayErrorContext(&e)
                ))
            }
        };

        // Freshly launched instances can be missing from a successful answer for a while.
        let Some(inst) = out.reservations().iter().flat_map(|r| r.instances()).next() else {
            debug!("[AWS API] DescribeInstances {} returned no record", instance_id);
            return Ok(InstanceLookup::NoRecord);
        };

        let runtime_state = inst
            .state()
            .and_then(|s| s.name())
            .map(|n| RuntimeState::parse(n.as_str()))
            .unwrap_or_else(|| RuntimeState::Unknown("unknown".to_string()));
        let launch_time = inst
            .launch_time()
            .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos()));

        Ok(InstanceLookup::Found(InstanceSnapshot {
            instance_id: instance_id.to_string(),
            runtime_state,
            public_ip: inst.public_ip_address().map(str::to_string),
            launch_time,
        }))
    }

    async fn describe_status_checks(&self, instance_id: &str) -> Result<Option<StatusCheckSummary>> {
        let out = self
            .ec2
            .describe_instance_status()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| anyhow!("DescribeInstanceStatus {} failed: {}", instance_id, DisplayErrorContext(&e)))?;

        let Some(status) = out.instance_statuses().first() else {
            return Ok(None);
        };
        let system = status
            .system_status()
            .and_then(|s| s.status())
            .map(|s| CheckStatus::parse(s.as_str()))
            .unwrap_or_else(|| CheckStatus::Other("unknown".to_string()));
        let instance = status
            .instance_status()
            .and_then(|s| s.status())
            .map(|s| CheckStatus::parse(s.as_str()))
            .unwrap_or_else(|| CheckStatus::Other("unknown".to_string()));
        Ok(Some(StatusCheckSummary::new(system, instance)))
    }

    async fn set_desired_capacity(
        &self,
        group_name: &str,
        desired_capacity: u32,
        honor_cooldown: bool,
    ) -> Result<()> {
        info!(
            "[AWS API] SetDesiredCapacity {} -> {} (honor_cooldown={})",
            group_name, desired_capacity, honor_cooldown
        );
        self.autoscaling
            .set_desired_capacity()
            .auto_scaling_group_name(group_name)
            .desired_capacity(i32::try_from(desired_capacity).context("desired capacity out of range")?)
            .honor_cooldown(honor_cooldown)
            .send()
            .await
            .map_err(|e| anyhow!("SetDesiredCapacity {} failed: {}", group_name, DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn describe_address(&self, allocation_id: &str) -> Result<AddressBinding> {
        let out = self
            .ec2
            .describe_addresses()
            .allocation_ids(allocation_id)
            .send()
            .await
            .map_err(|e| anyhow!("DescribeAddresses {} failed: {}", allocation_id, DisplayErrorContext(&e)))?;

        let address = out
            .addresses()
            .first()
            .ok_or_else(|| anyhow!("allocation {} not found", allocation_id))?;
        Ok(AddressBinding {
            allocation_id: allocation_id.to_string(),
            public_ip: address.public_ip().map(str::to_string),
            bound_instance_id: address.instance_id().map(str::to_string),
            association_id: address.association_id().map(str::to_string),
        })
    }

    async fn disassociate_address(&self, association_id: &str) -> Result<()> {
        info!("[AWS API] DisassociateAddress {}", association_id);
        self.ec2
            .disassociate_address()
            .association_id(association_id)
            .send()
            .await
            .map_err(|e| anyhow!("DisassociateAddress {} failed: {}", association_id, DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn associate_address(
        &self,
        allocation_id: &str,
        instance_id: &str,
        allow_reassociation: bool,
    ) -> Result<Option<String>> {
        info!("[AWS API] AssociateAddress {} -> {}", allocation_id, instance_id);
        let out = self
            .ec2
            .associate_address()
            .allocation_id(allocation_id)
            .instance_id(instance_id)
            .allow_reassociation(allow_reassociation)
            .send()
            .await
            .map_err(|e| {
                anyhow!(
                    "AssociateAddress {} -> {} failed: {}",
                    allocation_id,
                    instance_id,
                    DisplayErrorContext(&e)
                )
            })?;
        Ok(out.association_id().map(str::to_string))
    }

    async fn put_parameter(&self, name: &str, value: &str, overwrite: bool) -> Result<()> {
        self.ssm
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(ParameterType::String)
            .overwrite(overwrite)
            .send()
            .await
            .map_err(|e| anyhow!("PutParameter {} failed: {}", name, DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn create_or_update_tags(&self, group_name: &str, tags: &[GroupTag]) -> Result<()> {
        let mut req = self.autoscaling.create_or_update_tags();
        for tag in tags {
            req = req.tags(
                Tag::builder()
                    .resource_id(group_name)
                    .resource_type(GROUP_RESOURCE_TYPE)
                    .key(&tag.key)
                    .value(&tag.value)
                    .propagate_at_launch(tag.propagate_at_launch)
                    .build()?,
            );
        }
        req.send().await.map_err(|e| {
            anyhow!(
                "CreateOrUpdateTags {} failed: {}",
                group_name,
                DisplayErrorContext(&e)
            )
        })?;
        Ok(())
    }

    async fn publish_notification(&self, channel: &str, subject: &str, message: &str) -> Result<bool> {
        self.sns
            .publish()
            .topic_arn(channel)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| anyhow!("Publish to {} failed: {}", channel, DisplayErrorContext(&e)))?;
        Ok(true)
    }
}
