use async_trait::async_trait;
use pricetier_core::{PriceClass, PriceClassId, PriceClassSource, SourceError};
use sqlx::Row;

use crate::repositories::{source_error, RepositoryError};
use crate::DbPool;

/// SQLite-backed price class reference data.
pub struct SqlPriceClassSource {
    pool: DbPool,
}

impl SqlPriceClassSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &PriceClassId) -> Result<Option<PriceClass>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, parent_id, description
             FROM price_class
             WHERE id = ? COLLATE NOCASE",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| PriceClass {
            id: PriceClassId(row.get::<String, _>("id")),
            parent_id: row.get::<Option<String>, _>("parent_id").map(PriceClassId),
            description: row.get::<Option<String>, _>("description"),
        }))
    }
}

#[async_trait]
impl PriceClassSource for SqlPriceClassSource {
    async fn get(&self, id: &PriceClassId) -> Result<Option<PriceClass>, SourceError> {
        self.fetch(id).await.map_err(source_error)
    }
}
