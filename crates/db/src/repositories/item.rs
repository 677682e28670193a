use async_trait::async_trait;
use pricetier_core::{
    CascadeControl, InventoryId, ItemBasePrice, ItemBasePriceSource, PriceCascadeEngine,
    SourceError,
};
use rust_decimal::Decimal;
use sqlx::Row;
use tracing::info;

use crate::repositories::sales_price::SqlSalesPriceCatalog;
use crate::repositories::{parse_optional_decimal, source_error, RepositoryError};
use crate::DbPool;

/// SQLite-backed item base price settings.
pub struct SqlItemBasePriceSource {
    pool: DbPool,
}

impl SqlItemBasePriceSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_base_price(
        &self,
        inventory_id: &InventoryId,
        currency_id: &str,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let row = sqlx::query(
            "SELECT base_price FROM item_base_price WHERE inventory_id = ? AND currency_id = ?",
        )
        .bind(inventory_id.as_str())
        .bind(currency_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => parse_optional_decimal(
                "item_base_price.base_price",
                row.get::<Option<String>, _>("base_price").as_deref(),
            ),
            None => Ok(None),
        }
    }

    async fn fetch_base_prices(
        &self,
        inventory_id: &InventoryId,
    ) -> Result<Vec<ItemBasePrice>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT b.currency_id, b.base_price, i.base_unit
             FROM item_base_price b
             JOIN inventory_item i ON i.id = b.inventory_id
             WHERE b.inventory_id = ?
             ORDER BY b.currency_id",
        )
        .bind(inventory_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ItemBasePrice {
                    currency_id: row.get("currency_id"),
                    base_unit: row.get("base_unit"),
                    base_price: parse_optional_decimal(
                        "item_base_price.base_price",
                        row.get::<Option<String>, _>("base_price").as_deref(),
                    )?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ItemBasePriceSource for SqlItemBasePriceSource {
    async fn base_price(
        &self,
        inventory_id: &InventoryId,
        currency_id: &str,
    ) -> Result<Option<Decimal>, SourceError> {
        self.fetch_base_price(inventory_id, currency_id).await.map_err(source_error)
    }

    async fn base_prices(
        &self,
        inventory_id: &InventoryId,
    ) -> Result<Vec<ItemBasePrice>, SourceError> {
        self.fetch_base_prices(inventory_id).await.map_err(source_error)
    }
}

/// Outcome of a base-price mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BasePriceChange {
    pub changed: bool,
    pub cascaded: usize,
}

/// Writes a new base price and, when it actually changed from a stored
/// prior value, commits the percent-off cascade in the same transaction.
///
/// The cascade is skipped for newly created settings, non-positive prices,
/// and under an explicit `CascadeControl::Suppress` scope; writing the
/// staged plan here (not inside the engine) is what keeps the cascade from
/// re-triggering itself.
pub async fn set_base_price(
    pool: &DbPool,
    inventory_id: &InventoryId,
    currency_id: &str,
    new_price: Decimal,
    control: CascadeControl,
) -> Result<BasePriceChange, RepositoryError> {
    let source = SqlItemBasePriceSource::new(pool.clone());
    let prior = source.fetch_base_price(inventory_id, currency_id).await?;

    if prior == Some(new_price) {
        return Ok(BasePriceChange { changed: false, cascaded: 0 });
    }

    let run_cascade =
        !control.is_suppressed() && prior.is_some() && new_price > Decimal::ZERO;
    let plan = if run_cascade {
        let engine = PriceCascadeEngine::new(SqlSalesPriceCatalog::new(pool.clone()));
        Some(engine.plan(inventory_id, new_price).await?)
    } else {
        None
    };

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO item_base_price (inventory_id, currency_id, base_price)
         VALUES (?, ?, ?)
         ON CONFLICT (inventory_id, currency_id) DO UPDATE SET base_price = excluded.base_price",
    )
    .bind(inventory_id.as_str())
    .bind(currency_id)
    .bind(new_price.to_string())
    .execute(&mut *tx)
    .await?;

    let mut cascaded = 0;
    if let Some(plan) = &plan {
        for update in &plan.updates {
            sqlx::query("UPDATE sales_price SET sales_price = ? WHERE row_id = ?")
                .bind(update.new_price.to_string())
                .bind(update.row_id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        cascaded = plan.updates.len();
    }
    tx.commit().await?;

    info!(
        item = %inventory_id,
        currency = currency_id,
        prior = ?prior,
        new = %new_price,
        cascaded,
        "base price updated"
    );

    Ok(BasePriceChange { changed: true, cascaded })
}

/// All known inventory item ids, in id order.
pub async fn list_item_ids(pool: &DbPool) -> Result<Vec<InventoryId>, RepositoryError> {
    let rows = sqlx::query("SELECT id FROM inventory_item ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|row| InventoryId(row.get("id"))).collect())
}

/// Zeroes every base price of an item. Used when a cloned item should not
/// inherit the source's pricing.
pub async fn zero_base_prices(
    pool: &DbPool,
    inventory_id: &InventoryId,
) -> Result<usize, RepositoryError> {
    let result = sqlx::query("UPDATE item_base_price SET base_price = '0' WHERE inventory_id = ?")
        .bind(inventory_id.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() as usize)
}

#[cfg(test)]
mod tests {
    use pricetier_core::{CascadeControl, InventoryId, ItemBasePriceSource};
    use rust_decimal::Decimal;
    use sqlx::Row;
    use uuid::Uuid;

    use super::{set_base_price, zero_base_prices, SqlItemBasePriceSource};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        sqlx::query("INSERT INTO inventory_item (id, base_unit) VALUES ('WIDGET', 'EA')")
            .execute(&pool)
            .await
            .expect("insert item");
        sqlx::query(
            "INSERT INTO item_base_price (inventory_id, currency_id, base_price)
             VALUES ('WIDGET', 'USD', '100.00')",
        )
        .execute(&pool)
        .await
        .expect("insert base price");
        pool
    }

    async fn insert_percent_off_row(pool: &DbPool, row_id: u128, pct: &str, price: &str) {
        sqlx::query(
            "INSERT INTO sales_price (
                 row_id, inventory_id, price_type, price_code, customer_id,
                 price_class_id, uom, currency_id, break_qty, sales_price,
                 percent_off, effective_date, expiration_date
             ) VALUES (?, 'WIDGET', 'A', '', NULL, NULL, 'EA', 'USD', '0', ?, ?, NULL, NULL)",
        )
        .bind(Uuid::from_u128(row_id).to_string())
        .bind(price)
        .bind(pct)
        .execute(pool)
        .await
        .expect("insert percent-off row");
    }

    async fn stored_price(pool: &DbPool, row_id: u128) -> Decimal {
        let raw: String = sqlx::query("SELECT sales_price FROM sales_price WHERE row_id = ?")
            .bind(Uuid::from_u128(row_id).to_string())
            .fetch_one(pool)
            .await
            .expect("read row")
            .get("sales_price");
        raw.parse().expect("stored decimal")
    }

    fn widget() -> InventoryId {
        InventoryId("WIDGET".to_string())
    }

    #[tokio::test]
    async fn base_price_change_cascades_percent_off_rows() {
        let pool = setup_pool().await;
        insert_percent_off_row(&pool, 1, "15", "85.0000").await;

        let change =
            set_base_price(&pool, &widget(), "USD", Decimal::new(200, 0), CascadeControl::Apply)
                .await
                .expect("set base price");

        assert!(change.changed);
        assert_eq!(change.cascaded, 1);
        assert_eq!(stored_price(&pool, 1).await, Decimal::new(170, 0));

        pool.close().await;
    }

    #[tokio::test]
    async fn unchanged_base_price_is_a_no_op() {
        let pool = setup_pool().await;
        insert_percent_off_row(&pool, 1, "15", "85.0000").await;

        let change =
            set_base_price(&pool, &widget(), "USD", Decimal::new(100, 0), CascadeControl::Apply)
                .await
                .expect("set base price");

        assert!(!change.changed);
        assert_eq!(stored_price(&pool, 1).await, Decimal::new(85, 0));

        pool.close().await;
    }

    #[tokio::test]
    async fn suppressed_scope_writes_the_price_without_cascading() {
        let pool = setup_pool().await;
        insert_percent_off_row(&pool, 1, "15", "85.0000").await;

        let change = set_base_price(
            &pool,
            &widget(),
            "USD",
            Decimal::new(200, 0),
            CascadeControl::Suppress,
        )
        .await
        .expect("set base price");

        assert!(change.changed);
        assert_eq!(change.cascaded, 0);
        assert_eq!(stored_price(&pool, 1).await, Decimal::new(85, 0));

        let source = SqlItemBasePriceSource::new(pool.clone());
        let stored = source.base_price(&widget(), "USD").await.expect("read base");
        assert_eq!(stored, Some(Decimal::new(200, 0)));

        pool.close().await;
    }

    #[tokio::test]
    async fn first_base_price_write_does_not_cascade() {
        let pool = setup_pool().await;
        sqlx::query("INSERT INTO inventory_item (id, base_unit) VALUES ('GADGET', 'EA')")
            .execute(&pool)
            .await
            .expect("insert item");

        let change = set_base_price(
            &pool,
            &InventoryId("GADGET".to_string()),
            "USD",
            Decimal::new(50, 0),
            CascadeControl::Apply,
        )
        .await
        .expect("set base price");

        assert!(change.changed);
        assert_eq!(change.cascaded, 0);

        pool.close().await;
    }

    #[tokio::test]
    async fn zero_base_prices_clears_every_currency() {
        let pool = setup_pool().await;
        sqlx::query(
            "INSERT INTO item_base_price (inventory_id, currency_id, base_price)
             VALUES ('WIDGET', 'EUR', '92.00')",
        )
        .execute(&pool)
        .await
        .expect("insert eur base price");

        let zeroed = zero_base_prices(&pool, &widget()).await.expect("zero");
        assert_eq!(zeroed, 2);

        let source = SqlItemBasePriceSource::new(pool.clone());
        let settings = source.base_prices(&widget()).await.expect("read settings");
        assert!(settings.iter().all(|s| s.base_price == Some(Decimal::ZERO)));

        pool.close().await;
    }
}
