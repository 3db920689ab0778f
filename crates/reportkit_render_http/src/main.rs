//! Report server binary entry point.

use reportkit_render_http::{ApiState, SpecServerConfig, start_server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reportkit_render_http=info,reportkit_render=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = SpecServerConfig::from_env();
    let state = ApiState::new(cfg.load_brand_assets());

    start_server(&cfg.addr, state).await?;

    Ok(())
}
