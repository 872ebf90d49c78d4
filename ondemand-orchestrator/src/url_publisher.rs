use ondemand_common::{GroupTag, TAG_API_START_URL, TAG_API_STATUS_URL, TAG_API_URL};
use ondemand_providers::InfraProvider;
use serde::Serialize;
use tracing::info;

use crate::error::ControlError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedUrls {
    pub api_url: String,
    pub start_url: String,
    pub status_url: String,
}

impl PublishedUrls {
    fn derive(base: &str) -> Self {
        Self {
            api_url: base.to_string(),
            start_url: format!("{}/start", base),
            status_url: format!("{}/status", base),
        }
    }

    fn tags(&self) -> Vec<GroupTag> {
        vec![
            GroupTag::propagated(TAG_API_URL, self.api_url.clone()),
            GroupTag::propagated(TAG_API_START_URL, self.start_url.clone()),
            GroupTag::propagated(TAG_API_STATUS_URL, self.status_url.clone()),
        ]
    }
}

/// Store the endpoint in the parameter store and tag the group with it.
/// `explicit` wins over `default_url`; neither present is a hard failure.
/// Single attempt, errors surface unchanged.
pub async fn publish_url(
    provider: &(impl InfraProvider + ?Sized),
    group_name: &str,
    parameter_name: &str,
    explicit: Option<&str>,
    default_url: Option<&str>,
) -> Result<PublishedUrls, ControlError> {
    let url = explicit
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .or_else(|| default_url.map(str::trim).filter(|u| !u.is_empty()))
        .ok_or(ControlError::MissingConfiguration("API_GATEWAY_URL"))?;

    let urls = PublishedUrls::derive(url);

    provider.put_parameter(parameter_name, &urls.api_url, true).await?;
    info!(parameter = parameter_name, api_url = %urls.api_url, "[UrlPublisher] Updated parameter with API URL");

    provider.create_or_update_tags(group_name, &urls.tags()).await?;
    info!(group = group_name, "[UrlPublisher] Updated URL tags on group");

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondemand_providers::mock::{MockCall, MockOp, MockProvider};

    const PARAM: &str = "/ondemand/api-url";

    #[tokio::test]
    async fn explicit_url_overrides_default() {
        let p = MockProvider::new("asg", "eipalloc-1");
        let urls = publish_url(&p, "asg", PARAM, Some("https://x.example"), Some("https://default"))
            .await
            .unwrap();
        assert_eq!(urls.start_url, "https://x.example/start");
        assert_eq!(urls.status_url, "https://x.example/status");
        assert_eq!(p.parameter(PARAM).as_deref(), Some("https://x.example"));
    }

    #[tokio::test]
    async fn writes_parameter_then_three_propagated_tags() {
        let p = MockProvider::new("asg", "eipalloc-1");
        publish_url(&p, "asg", PARAM, None, Some("https://api.example/prod"))
            .await
            .unwrap();

        let calls = p.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            MockCall::PutParameter {
                name: PARAM.into(),
                value: "https://api.example/prod".into(),
                overwrite: true,
            }
        );
        let tags = p.tags();
        assert_eq!(tags.len(), 3);
        assert!(tags.iter().all(|t| t.propagate_at_launch));
        assert!(tags
            .iter()
            .any(|t| t.key == TAG_API_STATUS_URL && t.value == "https://api.example/prod/status"));
    }

    #[tokio::test]
    async fn republishing_overwrites() {
        let p = MockProvider::new("asg", "eipalloc-1");
        publish_url(&p, "asg", PARAM, Some("https://a"), None).await.unwrap();
        publish_url(&p, "asg", PARAM, Some("https://b"), None).await.unwrap();
        assert_eq!(p.parameter(PARAM).as_deref(), Some("https://b"));
        assert_eq!(p.tags().len(), 3);
    }

    #[tokio::test]
    async fn no_url_fails_fast_without_calls() {
        let p = MockProvider::new("asg", "eipalloc-1");
        let err = publish_url(&p, "asg", PARAM, Some("  "), None).await.unwrap_err();
        assert!(matches!(err, ControlError::MissingConfiguration(_)));
        assert!(p.calls().is_empty());
    }

    #[tokio::test]
    async fn parameter_failure_skips_tagging() {
        let p = MockProvider::new("asg", "eipalloc-1");
        p.fail_next(MockOp::PutParameter, "AccessDenied");
        let err = publish_url(&p, "asg", PARAM, Some("https://a"), None).await.unwrap_err();
        assert!(matches!(err, ControlError::ProviderUnavailable(_)));
        assert!(p.tags().is_empty());
    }
}
