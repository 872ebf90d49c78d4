use tracing::Span;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Install the process-wide fmt subscriber. `RUST_LOG` wins over the default `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Span for one stateless invocation (HTTP request, event, scheduled tick).
pub fn invocation_span(trigger: &'static str) -> Span {
    tracing::info_span!("invocation", trigger, invocation_id = %Uuid::new_v4())
}
