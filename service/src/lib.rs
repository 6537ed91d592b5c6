use config::Config;
use events::{ChangeFeed, EventPublisher};
use log::info;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sse::SseDomainEventHandler;
use std::sync::Arc;
use storage::{FsBucket, ObjectStorage};
use tokio::time::Duration;

pub mod config;
pub mod logging;
pub mod storage;

pub async fn init_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    info!(
        "Database pool config: max_connections={}, min_connections={}, \
         connect_timeout={}s, acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
        config.db_max_connections,
        config.db_min_connections,
        config.db_connect_timeout_secs,
        config.db_acquire_timeout_secs,
        config.db_idle_timeout_secs,
        config.db_max_lifetime_secs,
    );

    let mut opt = ConnectOptions::new::<&str>(config.database_url());
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Info)
        .set_schema_search_path("meeting_hub"); // Setting default PostgreSQL schema

    let db = Database::connect(opt).await?;

    Ok(db)
}

// Service-level state shared by every request handler.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub database_connection: Arc<DatabaseConnection>,
    pub config: Config,
    /// Publishes committed row changes to the change feed and SSE clients
    pub event_publisher: Arc<EventPublisher>,
    pub change_feed: ChangeFeed,
    pub sse_manager: Arc<sse::Manager>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl AppState {
    /// Builds the state with a filesystem bucket at `config.recordings_root` and
    /// an event publisher that feeds both the in-process change feed and SSE.
    pub fn new(app_config: Config, db: &Arc<DatabaseConnection>) -> Self {
        let storage = Arc::new(FsBucket::new(app_config.recordings_root.clone()));
        Self::with_storage(app_config, db, storage)
    }

    pub fn with_storage(
        app_config: Config,
        db: &Arc<DatabaseConnection>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let change_feed = ChangeFeed::default();
        let sse_manager = Arc::new(sse::Manager::new());
        let event_publisher = EventPublisher::new()
            .with_handler(Arc::new(change_feed.clone()))
            .with_handler(Arc::new(SseDomainEventHandler::new(sse_manager.clone())));

        Self {
            database_connection: Arc::clone(db),
            config: app_config,
            event_publisher: Arc::new(event_publisher),
            change_feed,
            sse_manager,
            storage,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }
}
