use ondemand_orchestrator::Services;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    pub fn new(services: Services) -> Arc<Self> {
        Arc::new(Self { services })
    }
}
