use anyhow::Context;
use ondemand_api::app::AppState;
use ondemand_api::routes::create_router;
use ondemand_orchestrator::provider_manager::ProviderManager;
use ondemand_orchestrator::{address_binder_job, logger, Config, Services};
use std::net::SocketAddr;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logger::init();

    let config = Config::from_env().context("invalid configuration")?;
    let provider = ProviderManager::get_provider(&config.provider, &config)
        .await
        .with_context(|| format!("failed to initialise provider '{}'", config.provider))?;
    info!("[API] Provider: {}", config.provider);

    let services = Services::new(provider, config.clone());

    // Deployment-time URL publication.
    if config.publish_url_on_startup {
        match services.publish_url(None).await {
            Ok(urls) => info!("[API] Published API URL {}", urls.api_url),
            Err(e) => error!(kind = e.kind(), "[API] Publishing URL on startup failed: {}", e),
        }
    }

    if let Some(every) = config.bind_schedule {
        tokio::spawn(address_binder_job::run(services.clone(), every));
    }

    let state = AppState::new(services);
    let app = create_router().with_state(state);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid BIND_ADDR '{}'", config.bind_addr))?;
    info!("[API] Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
