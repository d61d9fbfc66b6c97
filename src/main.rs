use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use openfeed::{api, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let addr = config.server_address();
    let state = AppState::new(config).await?;
    let app = api::app(state);

    info!("server starting on http://{}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
