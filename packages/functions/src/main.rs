//! Runs the functions locally. Identity accounts and documents live in this
//! process only and are lost on exit.

use functions::{Local, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new()?;
    tracing::info!("settings loaded");

    let local = Local::start(&settings).await?;
    let app = local.router();
    let addr = settings.server.addr();
    tracing::info!("Starting functions on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
