//! Regdesk Server - event registration and check-in
//!
//! Serves the REST API. `regdesk-server hash-password <password>` prints an
//! Argon2 hash for the `admin.password_hash` setting and exits.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use regdesk_server::{
    api,
    config::{AppConfig, LoggingConfig, StoreBackend},
    periods::SystemClock,
    services::{
        admin::hash_password,
        redis::RedisStore,
        store::{MemoryStore, SharedStore},
        stripe::StripeClient,
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        let password = args
            .get(2)
            .context("usage: regdesk-server hash-password <password>")?;
        println!("{}", hash_password(password)?);
        return Ok(());
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Regdesk Server v{}", env!("CARGO_PKG_VERSION"));

    if config.admin.password_hash.is_empty() {
        tracing::warn!("No admin password hash configured, admin login is disabled");
    } else if config.admin.signing_secret().is_none() {
        anyhow::bail!("admin.jwt_secret (JWT_SECRET) must be set to a private value when admin login is enabled");
    }

    let store: SharedStore = match config.store.backend {
        StoreBackend::Redis => {
            let store = RedisStore::new(&config.store.url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Connected to Redis");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let payments = Arc::new(StripeClient::new(&config.stripe));
    let clock = Arc::new(SystemClock::new(config.event.utc_offset_minutes));
    let services = Services::new(&config, store, payments, clock);

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Install the global subscriber; the returned guard flushes the file writer on drop
fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("regdesk_server={},tower_http=debug", config.level).into());

    let json = config.format.eq_ignore_ascii_case("json");
    let stdout_json = json.then(|| fmt::layer().json());
    let stdout_pretty = (!json).then(|| fmt::layer());

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "regdesk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_json)
        .with(stdout_pretty)
        .with(file_layer)
        .init();

    guard
}
