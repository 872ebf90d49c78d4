// Common test utilities and fixtures
#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use ondemand_api::app::AppState;
use ondemand_api::routes::create_router;
use ondemand_orchestrator::clock::FakeClock;
use ondemand_orchestrator::{Config, Services};
use ondemand_providers::mock::MockProvider;
use std::sync::Arc;

pub const GROUP: &str = "ondemand-asg";
pub const ALLOCATION: &str = "eipalloc-0test";
pub const PARAMETER: &str = "/ondemand/api-url";

pub fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut pairs: Vec<(String, String)> = vec![
        ("ASG_NAME".into(), GROUP.into()),
        ("EIP_ALLOCATION_ID".into(), ALLOCATION.into()),
        ("SSM_PARAM_NAME".into(), PARAMETER.into()),
        ("PROVIDER".into(), "mock".into()),
    ];
    pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    Config::from_lookup(move |key| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("test config")
}

pub fn mock_provider() -> Arc<MockProvider> {
    Arc::new(MockProvider::new(GROUP, ALLOCATION))
}

/// Router wired like main.rs, on top of the given mock and a virtual clock.
pub fn create_test_app_service(mock: Arc<MockProvider>, config: Config) -> Router {
    let services = Services::new(mock, config).with_clock(Arc::new(FakeClock::new()));
    let state = AppState::new(services);
    create_router().with_state(state)
}

pub fn test_server(mock: Arc<MockProvider>) -> TestServer {
    TestServer::new(create_test_app_service(mock, test_config(&[]))).expect("test server")
}
