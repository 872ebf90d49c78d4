use serde::{Deserialize, Serialize};

/// Instance lifecycle notification, in the scheduler/event-bus envelope shape.
/// Scheduled ticks arrive with no `detail` (or no instance id in it).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct LifecycleEvent {
    #[serde(default, rename = "detail-type", skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<String>,
    #[serde(default)]
    pub detail: Option<LifecycleDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct LifecycleDetail {
    #[serde(default, rename = "EC2InstanceId")]
    pub instance_id: Option<String>,
}

impl LifecycleEvent {
    pub fn instance_id(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|d| d.instance_id.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
