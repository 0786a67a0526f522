use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use bloomery_core::config::{AppConfig, ConfigError, LoadOptions};
use bloomery_db::repositories::{
    CatalogRepository, OrderRepository, SqlCatalogRepository, SqlOrderRepository,
};
use bloomery_db::{connect_from_config, migrations, DbPool};

use crate::contact::{Mailer, MailerError, NoopMailer, SmtpMailer};
use crate::uploads::ImageStore;

/// Shared handler state: repositories behind trait objects so tests can swap
/// in the in-memory implementations.
#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub images: Arc<ImageStore>,
    pub mailer: Arc<dyn Mailer>,
}

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: ApiState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("could not prepare uploads directory: {0}")]
    Uploads(#[source] std::io::Error),
    #[error("smtp mailer setup failed: {0}")]
    Mailer(#[source] MailerError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let images = ImageStore::new(config.uploads.dir.clone());
    images.ensure_dir().await.map_err(BootstrapError::Uploads)?;

    let mailer: Arc<dyn Mailer> = if config.smtp.enabled {
        Arc::new(SmtpMailer::from_config(&config.smtp).map_err(BootstrapError::Mailer)?)
    } else {
        Arc::new(NoopMailer)
    };
    info!(
        event_name = "system.bootstrap.mailer_ready",
        transport = if mailer.is_noop() { "noop" } else { "smtp" },
        "contact mailer initialized"
    );

    let state = ApiState {
        catalog: Arc::new(SqlCatalogRepository::new(db_pool.clone())),
        orders: Arc::new(SqlOrderRepository::new(db_pool.clone())),
        images: Arc::new(images),
        mailer,
    };

    Ok(Application { config, db_pool, state })
}


#[cfg(test)]
mod tests {
    use bloomery_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    #[tokio::test]
    async fn bootstrap_prepares_schema_and_uploads_dir() {
        let uploads = tempfile::tempdir().expect("tempdir");
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                uploads_dir: Some(uploads.path().join("images")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('product', 'customer_order', 'order_item')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("baseline tables available after bootstrap");
        assert_eq!(table_count, 3);

        assert!(uploads.path().join("images").is_dir());
        assert!(app.state.mailer.is_noop(), "smtp disabled by default");

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_rejects_invalid_database_url() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/shop".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("database.url"));
    }
}
