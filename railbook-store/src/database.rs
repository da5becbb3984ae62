use railbook_core::CoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Every store failure surfaces to callers as a persistence error.
pub(crate) fn persistence(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::Database(db) => CoreError::Persistence(db.message().to_string()),
        sqlx::Error::PoolTimedOut => CoreError::Persistence("data store unavailable".to_string()),
        _ => CoreError::Persistence(err.to_string()),
    }
}
