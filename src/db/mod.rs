//! Database module providing connection management, migrations, and queries.

pub mod accounts;
pub mod keys;
pub mod tokens;
pub mod users;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Database connection pool wrapper.
///
/// `DatabaseConnection` is itself a cheaply clonable handle to the
/// underlying sqlx pool.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        Self::connect(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
    }

    /// Connect to `url` with the given pool bounds.
    pub async fn connect(url: &str, max_connections: u32, min_connections: u32) -> AppResult<Self> {
        let mut options = ConnectOptions::new(url.to_owned());
        options
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        info!(
            "Database pool ready ({} max / {} min connections)",
            max_connections, min_connections
        );

        Ok(Self { conn })
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get access to the connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
    }

    /// Number of migrations not yet applied. Also fails if the database is unreachable.
    pub async fn pending_migrations(&self) -> AppResult<usize> {
        let pending = Migrator::get_pending_migrations(&self.conn).await?;
        Ok(pending.len())
    }
}
