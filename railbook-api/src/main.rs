use anyhow::Context;
use railbook_api::{
    app,
    metrics::Metrics,
    seed::demo_trains,
    state::{AppState, AuthConfig, RateLimiter},
};
use railbook_core::repository::{BookingRepository, TrainRepository};
use railbook_core::{Allocator, InMemoryStore};
use railbook_store::{app_config::Config, DbClient, PgBookingRepository, PgTrainRepository, RedisClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "railbook_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Railbook API on port {}", config.server.port);

    let (trains, bookings): (Arc<dyn TrainRepository>, Arc<dyn BookingRepository>) =
        match &config.database.url {
            Some(url) => {
                let db = DbClient::new(url, config.database.max_connections)
                    .await
                    .context("Failed to connect to Postgres")?;
                if config.database.run_migrations {
                    db.migrate().await.context("Failed to run migrations")?;
                }
                let trains: Arc<dyn TrainRepository> = Arc::new(PgTrainRepository::new(db.pool.clone()));
                let bookings: Arc<dyn BookingRepository> = Arc::new(PgBookingRepository::new(db.pool));
                (trains, bookings)
            }
            None => {
                tracing::warn!("No database.url configured, using the in-memory store");
                let store = Arc::new(InMemoryStore::with_trains(demo_trains()));
                let trains: Arc<dyn TrainRepository> = store.clone();
                let bookings: Arc<dyn BookingRepository> = store;
                (trains, bookings)
            }
        };

    let allocator = match config.allocation.seed {
        Some(seed) => {
            tracing::info!("Seat allocation seeded with {}", seed);
            Allocator::seeded(seed)
        }
        None => Allocator::from_entropy(),
    };

    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        audience: config.auth.audience.clone(),
    };
    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    let mut app_state = AppState::new(trains, bookings, Arc::new(allocator), auth, metrics);

    if let Some(redis) = &config.redis {
        match RedisClient::new(&redis.url).await {
            Ok(client) => {
                app_state = app_state.with_rate_limiter(RateLimiter {
                    redis: Arc::new(client),
                    requests_per_window: redis.requests_per_window,
                    window_seconds: redis.window_seconds,
                });
            }
            Err(e) => tracing::warn!("Redis unavailable, rate limiting disabled: {}", e),
        }
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
