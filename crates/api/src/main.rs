//! Laundry API server.
//!
//! Serves the order, inventory and staff authentication API consumed by the
//! web frontend.
//!
//! # Lifecycle
//!
//! 1. Load configuration (`.env` + environment)
//! 2. Initialize Sentry (optional) and tracing
//! 3. Create the `PostgreSQL` pool
//! 4. Apply the bootstrap admin account, if configured
//! 5. Spawn the hourly expired-session purge
//! 6. Serve until Ctrl+C / SIGTERM, then drain and close the pool
//!
//! Migrations are not run on startup; use `laundry-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use laundry_api::config::ApiConfig;
use laundry_api::services::BootstrapOutcome;
use laundry_api::state::AppState;
use laundry_api::{db, tasks};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "laundry_api=info,tower_http=debug".into());

    // JSON logs when LOG_FORMAT=json, text otherwise
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(config).await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}

async fn run(config: ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::create_pool(&config.database).await?;
    tracing::info!(
        min_connections = config.database.min_connections,
        max_connections = config.database.max_connections,
        "Database pool created"
    );

    let addr = config.socket_addr();
    let state = AppState::new(config, pool.clone())?;

    if let Some(admin) = &state.config().auth.bootstrap_admin {
        let outcome = state
            .auth()
            .bootstrap_admin(&admin.username, admin.password.expose_secret())
            .await?;
        match outcome {
            BootstrapOutcome::Created(user) => {
                tracing::info!(user_id = %user.id, username = %admin.username, "Bootstrap admin created");
            }
            BootstrapOutcome::AlreadyExists => {
                tracing::debug!(username = %admin.username, "Bootstrap admin already exists");
            }
        }
    }

    let purge = tasks::spawn_session_purge(
        pool.clone(),
        state.config().auth.session_ttl,
        tasks::SESSION_PURGE_INTERVAL,
    );

    let app = laundry_api::app(state)?
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("laundry-api listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
