//! Database layer for Scholar Harvest
//!
//! Provides:
//! - SeaORM entity models
//! - Repository with natural-key upserts
//! - Connection pool management and schema bootstrap

pub mod models;
mod repository;

pub use repository::{Repository, Upserted};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use models::*;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction,
    EntityName, EntityTrait, Schema, TransactionTrait,
};
use tracing::{debug, info};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connect_timeout())
            .idle_timeout(config.idle_timeout())
            .sqlx_logging(cfg!(debug_assertions));

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        let pool = Self { conn };
        pool.ping().await?;

        if config.create_schema {
            pool.create_schema().await?;
        }

        info!(
            max_connections = config.max_connections,
            backend = ?pool.conn.get_database_backend(),
            "Database connection established"
        );

        Ok(pool)
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Start the transaction one record is reconciled in
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        self.conn.begin().await.map_err(Into::into)
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;
        Ok(())
    }

    /// Create missing tables from the entity definitions.
    ///
    /// Referenced tables are created before the tables pointing at them.
    pub async fn create_schema(&self) -> Result<()> {
        create_table(&self.conn, ScientistEntity).await?;
        create_table(&self.conn, BibliometricsEntity).await?;
        create_table(&self.conn, PublicationEntity).await?;
        create_table(&self.conn, AuthorshipEntity).await?;
        create_table(&self.conn, OrganizationEntity).await?;
        create_table(&self.conn, OrganizationEdgeEntity).await?;
        create_table(&self.conn, AffiliationEntity).await?;
        create_table(&self.conn, ResearchAreaEntity).await?;
        create_table(&self.conn, ScientistResearchAreaEntity).await?;

        info!("Database schema ready");
        Ok(())
    }
}

async fn create_table<E: EntityTrait>(conn: &DatabaseConnection, entity: E) -> Result<()> {
    let backend = conn.get_database_backend();
    debug!(table = entity.table_name(), "Creating table if missing");

    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    conn.execute(backend.build(&stmt)).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::memory_pool;
    use super::*;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_schema_bootstrap_is_repeatable() {
        let pool = memory_pool().await;
        pool.create_schema().await.unwrap();

        assert_eq!(ScientistEntity::find().count(pool.conn()).await.unwrap(), 0);
        assert_eq!(OrganizationEdgeEntity::find().count(pool.conn()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_database_is_connection_error() {
        let mut config = DatabaseConfig::with_url("sqlite:///nonexistent-dir/harvest.db");
        config.connect_timeout_secs = 1;

        let err = DbPool::new(&config).await.err().expect("connect must fail");
        assert!(err.is_fatal());
    }
}
