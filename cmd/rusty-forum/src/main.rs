//! # Rusty-Forum Binary
//!
//! Assembles the application from configuration: picks the persistence
//! backend, wires the services and serves the Axum router.

#[cfg(not(feature = "web-axum"))]
compile_error!("rusty-forum is served through Axum; enable the `web-axum` feature");

use anyhow::Context;
use api_adapters::{router, AppState, Metrics};
use configs::{Backend, DatabaseSettings, LogFormat, LogSettings, Settings};
use domains::ActorId;
use services::{ForumServices, RateLimiter, Repositories, StaticActor, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use storage_adapters::MemoryStore;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("load settings")?;
    init_tracing(&settings.log)?;

    let actor = match settings.forum.actor_id {
        Some(id) => ActorId::from(id),
        None => {
            let generated = ActorId::new();
            warn!(actor = %generated, "forum.actor_id not set; using a generated actor");
            generated
        }
    };

    let repos = open_repositories(&settings.database).await?;
    let services = ForumServices::wire(
        repos,
        Arc::new(StaticActor::new(actor)),
        Arc::new(SystemClock),
        settings.forum.rate_limit_window(),
    )?;
    spawn_limiter_purge(services.limiter.clone(), settings.forum.rate_limit_purge_interval());

    let state = AppState::new(services, Arc::new(Metrics::new()))
        .with_request_timeout(settings.server.request_timeout())
        .with_internal_errors(settings.http.expose_internal_errors);
    let app = router(state);

    let address = settings.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("bind {address}"))?;
    info!(%address, backend = ?settings.database.backend, "Rusty-Forum listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("Rusty-Forum stopped");
    Ok(())
}

fn init_tracing(log: &LogSettings) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured filter.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.filter))
        .with_context(|| format!("invalid log filter {:?}", log.filter))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match log.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!(e))
}

async fn open_repositories(database: &DatabaseSettings) -> anyhow::Result<Repositories> {
    match database.backend {
        Backend::Memory => {
            let store = MemoryStore::new();
            info!("using the in-memory backend; data is lost on restart");
            Ok(Repositories {
                problems: store.problems,
                solutions: store.solutions,
                logs: store.logs,
            })
        }
        Backend::Postgres => open_postgres(database).await,
    }
}

#[cfg(feature = "db-postgres")]
async fn open_postgres(database: &DatabaseSettings) -> anyhow::Result<Repositories> {
    use secrecy::ExposeSecret;

    let url = database
        .url
        .as_ref()
        .context("database.url is required for the postgres backend")?;
    let store = storage_adapters::PgStore::connect(url.expose_secret(), database.max_connections).await?;
    Ok(Repositories {
        problems: store.problems,
        solutions: store.solutions,
        logs: store.logs,
    })
}

#[cfg(not(feature = "db-postgres"))]
async fn open_postgres(_database: &DatabaseSettings) -> anyhow::Result<Repositories> {
    anyhow::bail!("this binary was built without the `db-postgres` feature")
}

fn spawn_limiter_purge(limiter: Arc<RateLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = limiter.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = limiter.tracked(), "rate limiter purged");
            }
        }
    });
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => warn!(error = %e, "could not listen for ctrl-c; shutting down"),
    }
}
