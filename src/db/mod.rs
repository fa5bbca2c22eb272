//! Database Module
//!
//! Handles the embedded SurrealDB (RocksDB) connection and schema definitions

pub mod models;
pub mod query;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::utils::AppError;

/// Database service, owns the embedded SurrealDB handle
#[derive(Clone, Debug)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open the embedded database under `db_path` and apply the schema
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns("bazaar")
            .use_db("store")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        Self::define_schema(&db).await?;

        tracing::info!("Database connection established (SurrealDB, RocksDB backend)");

        Ok(Self { db })
    }

    /// Idempotent schema definitions
    ///
    /// 唯一索引兜底注册和建品时的重复预检查, 预检查之间的竞争写入
    /// 由索引拒绝。
    async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
        let statements = [
            "DEFINE TABLE IF NOT EXISTS user SCHEMALESS",
            "DEFINE TABLE IF NOT EXISTS product SCHEMALESS",
            "DEFINE TABLE IF NOT EXISTS order SCHEMALESS",
            "DEFINE INDEX IF NOT EXISTS user_username ON user FIELDS username UNIQUE",
            "DEFINE INDEX IF NOT EXISTS user_email ON user FIELDS email UNIQUE",
            "DEFINE INDEX IF NOT EXISTS product_name ON product FIELDS name UNIQUE",
            "DEFINE INDEX IF NOT EXISTS order_user ON order FIELDS user",
        ];

        for statement in statements {
            db.query(statement)
                .await
                .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?
                .check()
                .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;
        }

        Ok(())
    }
}
