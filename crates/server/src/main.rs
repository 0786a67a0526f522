mod bootstrap;
mod catalog;
mod contact;
mod error;
mod health;
mod orders;
mod uploads;

use anyhow::Result;
use axum::Router;
use tower_http::services::ServeDir;
use tracing::info;

use bloomery_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use bloomery_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let router = Router::new()
        .merge(catalog::router(app.state.clone()))
        .merge(orders::router(app.state.clone()))
        .merge(contact::router(app.state.clone()))
        .merge(health::router(app.db_pool.clone()))
        .nest_service("/uploads", ServeDir::new(app.state.images.dir()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.server.started",
        bind_address = %address,
        mail_transport = if app.state.mailer.is_noop() { "noop" } else { "smtp" },
        "bloomery-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    info!(event_name = "system.server.stopping", "bloomery-server stopping");
    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
