use anyhow::{bail, Result};
use ondemand_providers::InfraProvider;
use std::sync::Arc;

use crate::config::Config;

pub struct ProviderManager;

impl ProviderManager {
    /// Build the provider named by `PROVIDER`. Unknown names and providers
    /// not compiled into this binary are start-up errors.
    pub async fn get_provider(provider_name: &str, config: &Config) -> Result<Arc<dyn InfraProvider>> {
        match provider_name.trim().to_lowercase().as_str() {
            #[cfg(any(test, feature = "provider-mock"))]
            "mock" => Ok(Arc::new(local_mock(config))),
            #[cfg(feature = "provider-aws")]
            "aws" => Ok(Arc::new(ondemand_providers::aws::AwsProvider::from_env().await)),
            other => {
                let _ = config;
                bail!("provider '{}' is unknown or not enabled in this build", other)
            }
        }
    }
}

/// Local runs start with an empty group bound to the configured allocation.
#[cfg(any(test, feature = "provider-mock"))]
fn local_mock(config: &Config) -> ondemand_providers::mock::MockProvider {
    ondemand_providers::mock::MockProvider::new(&config.group_name, &config.allocation_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|k| match k {
            "ASG_NAME" => Some("asg".into()),
            "EIP_ALLOCATION_ID" => Some("eipalloc-1".into()),
            "SSM_PARAM_NAME" => Some("/p".into()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn mock_is_selectable_case_insensitively() {
        let provider = ProviderManager::get_provider(" Mock ", &config()).await.unwrap();
        let group = provider.describe_group("asg").await.unwrap();
        assert!(group.members.is_empty());
    }

    #[tokio::test]
    async fn unknown_provider_is_an_error() {
        assert!(ProviderManager::get_provider("gcp", &config()).await.is_err());
    }
}
