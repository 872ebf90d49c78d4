use crate::InfraProvider;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use ondemand_common::{
    AddressBinding, CheckStatus, GroupMember, GroupSnapshot, GroupTag, InstanceLookup,
    InstanceSnapshot, LifecycleState, RuntimeState, StatusCheckSummary,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    DescribeGroup,
    DescribeInstance,
    DescribeStatusChecks,
    SetDesiredCapacity,
    DescribeAddress,
    DisassociateAddress,
    AssociateAddress,
    PutParameter,
    CreateOrUpdateTags,
    PublishNotification,
}

/// Mutating calls, recorded in the order they were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    SetDesiredCapacity {
        group_name: String,
        desired_capacity: u32,
        honor_cooldown: bool,
    },
    DisassociateAddress {
        association_id: String,
    },
    AssociateAddress {
        allocation_id: String,
        instance_id: String,
        allow_reassociation: bool,
    },
    PutParameter {
        name: String,
        value: String,
        overwrite: bool,
    },
    CreateOrUpdateTags {
        group_name: String,
        tags: Vec<GroupTag>,
    },
    PublishNotification {
        channel: String,
        subject: String,
        message: String,
    },
}

struct MockInstance {
    state: RuntimeState,
    /// Each describe pops the next scripted state; the last one sticks.
    scripted: VecDeque<RuntimeState>,
    public_ip: Option<String>,
    checks: Option<StatusCheckSummary>,
    describes: usize,
    /// Remaining describes that answer with no record, before the instance shows up.
    hidden: usize,
}

#[derive(Default)]
struct MockState {
    group_name: String,
    desired_capacity: u32,
    members: Vec<GroupMember>,
    instances: HashMap<String, MockInstance>,
    address: AddressBinding,
    parameters: HashMap<String, String>,
    tags: Vec<GroupTag>,
    failures: HashMap<MockOp, VecDeque<String>>,
    calls: Vec<MockCall>,
    launched: usize,
}

impl MockState {
    fn take_failure(&mut self, op: MockOp) -> Result<()> {
        match self.failures.get_mut(&op).and_then(|q| q.pop_front()) {
            Some(msg) => Err(anyhow!(msg)),
            None => Ok(()),
        }
    }

    /// Emulates the scaling group launching members up to desired capacity.
    fn launch_up_to_desired(&mut self) {
        while self.members.len() < self.desired_capacity as usize {
            self.launched += 1;
            let instance_id = format!("i-mock{:04}", self.launched);
            self.members.push(GroupMember {
                instance_id: instance_id.clone(),
                lifecycle_state: LifecycleState::Pending,
            });
            self.instances.insert(
                instance_id,
                MockInstance {
                    state: RuntimeState::Pending,
                    scripted: VecDeque::from(vec![RuntimeState::Pending, RuntimeState::Running]),
                    public_ip: None,
                    checks: Some(StatusCheckSummary::new(CheckStatus::Ok, CheckStatus::Ok)),
                    describes: 0,
                    hidden: 0,
                },
            );
        }
    }
}

/// In-memory provider used by tests and local runs (`PROVIDER=mock`).
///
/// Holds one scaling group and one address allocation. All setters take `&self`
/// so a test can keep reshaping the world after handing the provider out.
pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    pub fn new(group_name: &str, allocation_id: &str) -> Self {
        let state = MockState {
            group_name: group_name.to_string(),
            address: AddressBinding {
                allocation_id: allocation_id.to_string(),
                public_ip: Some("203.0.113.10".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_desired(&self, desired_capacity: u32) {
        self.lock().desired_capacity = desired_capacity;
    }

    /// Add a group member whose instance is in `runtime` state.
    pub fn add_member(&self, instance_id: &str, lifecycle: LifecycleState, runtime: RuntimeState) {
        let mut st = self.lock();
        st.members.push(GroupMember {
            instance_id: instance_id.to_string(),
            lifecycle_state: lifecycle,
        });
        st.instances.insert(
            instance_id.to_string(),
            MockInstance {
                state: runtime,
                scripted: VecDeque::new(),
                public_ip: None,
                checks: None,
                describes: 0,
                hidden: 0,
            },
        );
    }

    /// Register an instance that the group does not report (e.g. one named by an event).
    pub fn add_instance(&self, instance_id: &str, runtime: RuntimeState) {
        self.lock().instances.insert(
            instance_id.to_string(),
            MockInstance {
                state: runtime,
                scripted: VecDeque::new(),
                public_ip: None,
                checks: None,
                describes: 0,
                hidden: 0,
            },
        );
    }

    /// Keep the member in the group but forget the instance record.
    pub fn forget_instance(&self, instance_id: &str) {
        self.lock().instances.remove(instance_id);
    }

    pub fn script_states(&self, instance_id: &str, states: Vec<RuntimeState>) {
        if let Some(inst) = self.lock().instances.get_mut(instance_id) {
            inst.scripted = states.into();
        }
    }

    /// The next `describes` lookups succeed but return no record, as a provider
    /// does right after launch before the instance becomes visible.
    pub fn hide_instance(&self, instance_id: &str, describes: usize) {
        if let Some(inst) = self.lock().instances.get_mut(instance_id) {
            inst.hidden = describes;
        }
    }

    pub fn set_public_ip(&self, instance_id: &str, ip: &str) {
        if let Some(inst) = self.lock().instances.get_mut(instance_id) {
            inst.public_ip = Some(ip.to_string());
        }
    }

    pub fn set_checks(&self, instance_id: &str, checks: Option<StatusCheckSummary>) {
        if let Some(inst) = self.lock().instances.get_mut(instance_id) {
            inst.checks = checks;
        }
    }

    /// Pretend the allocation is currently associated with `instance_id`.
    pub fn bind_address_to(&self, instance_id: &str, association_id: &str) {
        let mut st = self.lock();
        st.address.bound_instance_id = Some(instance_id.to_string());
        st.address.association_id = Some(association_id.to_string());
    }

    /// The next `op` call fails with `message` (queued, one per call).
    pub fn fail_next(&self, op: MockOp, message: &str) {
        self.lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(message.to_string());
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn desired_capacity(&self) -> u32 {
        self.lock().desired_capacity
    }

    pub fn address(&self) -> AddressBinding {
        self.lock().address.clone()
    }

    pub fn parameter(&self, name: &str) -> Option<String> {
        self.lock().parameters.get(name).cloned()
    }

    pub fn tags(&self) -> Vec<GroupTag> {
        self.lock().tags.clone()
    }

    pub fn describe_count(&self, instance_id: &str) -> usize {
        self.lock()
            .instances
            .get(instance_id)
            .map(|i| i.describes)
            .unwrap_or(0)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.lock()
            .members
            .iter()
            .map(|m| m.instance_id.clone())
            .collect()
    }
}

#[async_trait]
impl InfraProvider for MockProvider {
    async fn describe_group(&self, group_name: &str) -> Result<GroupSnapshot> {
        let mut st = self.lock();
        st.take_failure(MockOp::DescribeGroup)?;
        if st.group_name != group_name {
            return Err(anyhow!("auto scaling group {} not found", group_name));
        }
        Ok(GroupSnapshot {
            name: st.group_name.clone(),
            desired_capacity: st.desired_capacity,
            members: st.members.clone(),
        })
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceLookup> {
        let mut st = self.lock();
        st.take_failure(MockOp::DescribeInstance)?;
        let Some(inst) = st.instances.get_mut(instance_id) else {
            return Ok(InstanceLookup::NotFound);
        };
        inst.describes += 1;
        if inst.hidden > 0 {
            inst.hidden -= 1;
            return Ok(InstanceLookup::NoRecord);
        }
        if let Some(next) = inst.scripted.pop_front() {
            inst.state = next;
        }
        Ok(InstanceLookup::Found(InstanceSnapshot {
            instance_id: instance_id.to_string(),
            runtime_state: inst.state.clone(),
            public_ip: inst.public_ip.clone(),
            launch_time: Some(Utc::now()),
        }))
    }

    async fn describe_status_checks(&self, instance_id: &str) -> Result<Option<StatusCheckSummary>> {
        let mut st = self.lock();
        st.take_failure(MockOp::DescribeStatusChecks)?;
        Ok(st.instances.get(instance_id).and_then(|i| i.checks.clone()))
    }

    async fn set_desired_capacity(
        &self,
        group_name: &str,
        desired_capacity: u32,
        honor_cooldown: bool,
    ) -> Result<()> {
        let mut st = self.lock();
        st.take_failure(MockOp::SetDesiredCapacity)?;
        st.calls.push(MockCall::SetDesiredCapacity {
            group_name: group_name.to_string(),
            desired_capacity,
            honor_cooldown,
        });
        st.desired_capacity = desired_capacity;
        st.launch_up_to_desired();
        Ok(())
    }

    async fn describe_address(&self, allocation_id: &str) -> Result<AddressBinding> {
        let mut st = self.lock();
        st.take_failure(MockOp::DescribeAddress)?;
        if st.address.allocation_id != allocation_id {
            return Err(anyhow!("allocation {} not found", allocation_id));
        }
        Ok(st.address.clone())
    }

    async fn disassociate_address(&self, association_id: &str) -> Result<()> {
        let mut st = self.lock();
        st.take_failure(MockOp::DisassociateAddress)?;
        st.calls.push(MockCall::DisassociateAddress {
            association_id: association_id.to_string(),
        });
        if st.address.association_id.as_deref() != Some(association_id) {
            return Err(anyhow!("association {} not found", association_id));
        }
        st.address.association_id = None;
        st.address.bound_instance_id = None;
        Ok(())
    }

    async fn associate_address(
        &self,
        allocation_id: &str,
        instance_id: &str,
        allow_reassociation: bool,
    ) -> Result<Option<String>> {
        let mut st = self.lock();
        st.take_failure(MockOp::AssociateAddress)?;
        st.calls.push(MockCall::AssociateAddress {
            allocation_id: allocation_id.to_string(),
            instance_id: instance_id.to_string(),
            allow_reassociation,
        });
        if st.address.association_id.is_some() && !allow_reassociation {
            return Err(anyhow!("address {} is already in use", allocation_id));
        }
        let association_id = format!("eipassoc-{}", uuid::Uuid::new_v4().simple());
        st.address.bound_instance_id = Some(instance_id.to_string());
        st.address.association_id = Some(association_id.clone());
        Ok(Some(association_id))
    }

    async fn put_parameter(&self, name: &str, value: &str, overwrite: bool) -> Result<()> {
        let mut st = self.lock();
        st.take_failure(MockOp::PutParameter)?;
        st.calls.push(MockCall::PutParameter {
            name: name.to_string(),
            value: value.to_string(),
            overwrite,
        });
        if !overwrite && st.parameters.contains_key(name) {
            return Err(anyhow!("parameter {} already exists", name));
        }
        st.parameters.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn create_or_update_tags(&self, group_name: &str, tags: &[GroupTag]) -> Result<()> {
        let mut st = self.lock();
        st.take_failure(MockOp::CreateOrUpdateTags)?;
        st.calls.push(MockCall::CreateOrUpdateTags {
            group_name: group_name.to_string(),
            tags: tags.to_vec(),
        });
        for tag in tags {
            match st.tags.iter().position(|t| t.key == tag.key) {
                Some(pos) => st.tags[pos] = tag.clone(),
                None => st.tags.push(tag.clone()),
            }
        }
        Ok(())
    }

    async fn publish_notification(&self, channel: &str, subject: &str, message: &str) -> Result<bool> {
        let mut st = self.lock();
        st.take_failure(MockOp::PublishNotification)?;
        st.calls.push(MockCall::PublishNotification {
            channel: channel.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn raising_desired_capacity_launches_a_pending_member() {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.set_desired_capacity("asg", 1, false).await.unwrap();

        let group = p.describe_group("asg").await.unwrap();
        assert_eq!(group.desired_capacity, 1);
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].lifecycle_state, LifecycleState::Pending);

        let id = group.members[0].instance_id.clone();
        let first = p.describe_instance(&id).await.unwrap().into_snapshot().unwrap();
        let second = p.describe_instance(&id).await.unwrap().into_snapshot().unwrap();
        let third = p.describe_instance(&id).await.unwrap().into_snapshot().unwrap();
        assert_eq!(first.runtime_state, RuntimeState::Pending);
        assert_eq!(second.runtime_state, RuntimeState::Running);
        assert_eq!(third.runtime_state, RuntimeState::Running);
    }

    #[tokio::test]
    async fn unknown_instance_is_not_found_not_error() {
        let p = MockProvider::new("asg", "eipalloc-1");
        assert_eq!(p.describe_instance("i-nope").await.unwrap(), InstanceLookup::NotFound);
    }

    #[tokio::test]
    async fn hidden_instance_answers_no_record_then_appears() {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.add_instance("i-new", RuntimeState::Pending);
        p.hide_instance("i-new", 1);
        assert_eq!(p.describe_instance("i-new").await.unwrap(), InstanceLookup::NoRecord);
        let lookup = p.describe_instance("i-new").await.unwrap();
        assert!(matches!(lookup, InstanceLookup::Found(ref s) if s.runtime_state == RuntimeState::Pending));
        assert_eq!(p.describe_count("i-new"), 2);
    }

    #[tokio::test]
    async fn associate_without_reassociation_rejects_bound_address() {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.bind_address_to("i-a", "eipassoc-a");
        assert!(p.associate_address("eipalloc-1", "i-b", false).await.is_err());

        p.associate_address("eipalloc-1", "i-b", true).await.unwrap();
        assert_eq!(p.address().bound_instance_id.as_deref(), Some("i-b"));
    }

    #[tokio::test]
    async fn scripted_failures_are_one_shot() {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.fail_next(MockOp::DescribeGroup, "throttled");
        assert!(p.describe_group("asg").await.is_err());
        assert!(p.describe_group("asg").await.is_ok());
    }
}
