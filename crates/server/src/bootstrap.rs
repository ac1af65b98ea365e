use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use mailbot_core::config::{AppConfig, ConfigError, LoadOptions};
use mailbot_db::repositories::SqlUserRecordRepository;
use mailbot_db::{connect_with_settings, migrations, DbPool};
use mailbot_directory::{DirectoryError, HttpDirectoryClient};
use mailbot_engine::{ConversationRuntime, RuntimeSettings};
use mailbot_slack::events::{DirectMessageHandler, EventDispatcher, MentionHandler};
use mailbot_slack::socket::SocketModeRunner;

use crate::service::MailbotService;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub slack_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("directory client construction failed: {0}")]
    Directory(#[source] DirectoryError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let directory = HttpDirectoryClient::new(&config.mail).map_err(BootstrapError::Directory)?;
    let records = SqlUserRecordRepository::new(db_pool.clone());
    let runtime = Arc::new(ConversationRuntime::new(
        directory,
        records,
        RuntimeSettings::from_config(&config),
    ));
    let service = Arc::new(MailbotService::new(runtime, config.mail.admin_contact.clone()));

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(DirectMessageHandler::new(service.clone()));
    dispatcher.register(MentionHandler::new(service));

    Ok(Application { config, db_pool, slack_runner: SocketModeRunner::noop(dispatcher) })
}
