use std::time::Duration;

use crate::error::ControlError;

/// Environment-supplied identifiers shared by every invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub group_name: String,
    pub allocation_id: String,
    pub parameter_name: String,
    /// None disables failure notifications (not an error).
    pub notification_channel: Option<String>,
    pub default_url: Option<String>,
    pub provider: String,
    pub bind_addr: String,
    /// Scheduled address-binding tick; None = no background job.
    pub bind_schedule: Option<Duration>,
    pub publish_url_on_startup: bool,
    /// Redirect target for /start. Falls back to `https://{Host}/starting.html`.
    pub status_page_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ControlError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Treat empty / whitespace-only values as absent.
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ControlError::MissingConfiguration(key));

        let bind_schedule = get("BIND_SCHEDULE_SECONDS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let publish_url_on_startup = get("PUBLISH_URL_ON_STARTUP")
            .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            group_name: required("ASG_NAME")?,
            allocation_id: required("EIP_ALLOCATION_ID")?,
            parameter_name: required("SSM_PARAM_NAME")?,
            notification_channel: get("SNS_TOPIC_ARN"),
            default_url: get("API_GATEWAY_URL"),
            provider: get("PROVIDER").unwrap_or_else(|| "aws".to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            bind_schedule,
            publish_url_on_startup,
            status_page_url: get("STATUS_PAGE_URL"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    const BASE: [(&str, &str); 3] = [
        ("ASG_NAME", "ondemand-asg"),
        ("EIP_ALLOCATION_ID", "eipalloc-123"),
        ("SSM_PARAM_NAME", "/ondemand/api-url"),
    ];

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = Config::from_lookup(lookup(&BASE)).unwrap();
        assert_eq!(cfg.group_name, "ondemand-asg");
        assert_eq!(cfg.allocation_id, "eipalloc-123");
        assert_eq!(cfg.notification_channel, None);
        assert_eq!(cfg.default_url, None);
        assert_eq!(cfg.provider, "aws");
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.bind_schedule, None);
        assert!(!cfg.publish_url_on_startup);
    }

    #[test]
    fn missing_group_name_is_reported_by_key() {
        let err = Config::from_lookup(lookup(&BASE[1..])).unwrap_err();
        assert!(matches!(err, ControlError::MissingConfiguration("ASG_NAME")));
    }

    #[test]
    fn empty_notification_channel_disables_notifications() {
        let mut pairs = BASE.to_vec();
        pairs.push(("SNS_TOPIC_ARN", "  "));
        pairs.push(("BIND_SCHEDULE_SECONDS", "60"));
        pairs.push(("PUBLISH_URL_ON_STARTUP", "TRUE"));
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.notification_channel, None);
        assert_eq!(cfg.bind_schedule, Some(Duration::from_secs(60)));
        assert!(cfg.publish_url_on_startup);
    }

    #[test]
    fn zero_schedule_means_no_job() {
        let mut pairs = BASE.to_vec();
        pairs.push(("BIND_SCHEDULE_SECONDS", "0"));
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.bind_schedule, None);
    }
}
