use std::sync::Arc;

use anyhow::Context;

use sitecart_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sitecart_observability::init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let services = sitecart_api::app::services::build_services(&config).await?;
    let app = sitecart_api::app::build_app(Arc::new(services), &config.jwt_secret);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
