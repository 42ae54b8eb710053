//! Database layer using SeaORM over PostgreSQL.

pub mod build_results;
pub mod store;
pub mod test_case_results;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

pub use store::ResultStore;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect to PostgreSQL using the configured pool bounds.
    pub async fn new(config: &Config) -> AppResult<Self> {
        let mut options = ConnectOptions::new(config.database.url.clone());
        options
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(Self { conn })
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;
        info!("Database migrations complete");
        Ok(())
    }
}
