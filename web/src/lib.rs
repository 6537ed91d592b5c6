use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum_login::AuthManagerLayerBuilder;
use domain::user::Backend;
use log::*;
use service::config::ApiVersion;
use std::io;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

pub use error::{Error, Result};
pub use service::AppState;

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod protect;
mod router;
mod sse;

/// Interval between sweeps of expired sessions out of the session table.
const EXPIRED_SESSION_SWEEP_SECONDS: u64 = 60;

pub async fn init_server(app_state: AppState) -> io::Result<()> {
    info!(
        "Initializing server with config: interface {:?}, port {}",
        app_state.config.interface, app_state.config.port
    );

    // Sessions live next to the application tables in the `meeting_hub` schema.
    let pool = app_state
        .db_conn_ref()
        .get_postgres_connection_pool()
        .clone();
    let session_store = PostgresStore::new(pool)
        .with_schema_name("meeting_hub")
        .and_then(|store| store.with_table_name("authorized_sessions"))
        .map_err(io::Error::other)?;
    session_store.migrate().await.map_err(io::Error::other)?;

    let _deletion_task: JoinHandle<_> = tokio::task::spawn(
        session_store.clone().continuously_delete_expired(
            tokio::time::Duration::from_secs(EXPIRED_SESSION_SWEEP_SECONDS),
        ),
    );

    let session_expiry_seconds =
        i64::try_from(app_state.config.backend_session_expiry_seconds).unwrap_or(i64::MAX);
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(app_state.config.is_production())
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            session_expiry_seconds,
        )));

    let backend = Backend::new(&app_state.database_connection);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{host}:{}", app_state.config.port);
    let listener = TcpListener::bind(&server_url).await?;

    let allowed_origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring malformed CORS origin {origin:?}");
                None
            }
        })
        .collect();
    info!("CORS allowed origins: {allowed_origins:?}");

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(ApiVersion::field_name()),
        ])
        .expose_headers([HeaderName::from_static("content-disposition")])
        .allow_origin(allowed_origins);

    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(
        listener,
        router::define_routes(app_state)
            .layer(auth_layer)
            .layer(cors_layer),
    )
    .await
}
