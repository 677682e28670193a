use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use pricetier_core::{
    CascadePlan, CustomerId, InventoryId, PriceClassId, PriceCopyEngine, PriceLookup, PriceType,
    SalesPriceRow, SalesPriceCatalog, SourceError,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, warn};
use uuid::Uuid;

use crate::repositories::{
    parse_optional_date, parse_optional_decimal, parse_decimal, source_error, RepositoryError,
};
use crate::DbPool;

const SELECT_COLUMNS: &str = "row_id, inventory_id, price_type, price_code, customer_id, \
     price_class_id, uom, currency_id, break_qty, sales_price, percent_off, \
     effective_date, expiration_date";

/// SQLite-backed sales price catalog.
///
/// `find` resolves one hierarchy node the way the host price lookup does:
/// customer-specific beats class-specific beats all-customer beats base,
/// then the largest break quantity not exceeding the requested quantity,
/// then the lowest price.
pub struct SqlSalesPriceCatalog {
    pool: DbPool,
}

impl SqlSalesPriceCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn query_find(
        &self,
        lookup: &PriceLookup<'_>,
    ) -> Result<Option<SalesPriceRow>, RepositoryError> {
        let request = lookup.request;
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS}
             FROM sales_price
             WHERE inventory_id = ?
               AND currency_id = ?
               AND uom = ?
               AND (effective_date IS NULL OR effective_date <= ?)
               AND (expiration_date IS NULL OR expiration_date >= ?)
               AND CAST(break_qty AS REAL) <= CAST(? AS REAL)
               AND (
                     (price_type = 'C' AND customer_id = ?)
                  OR (price_type = 'P' AND price_class_id = ? COLLATE NOCASE)
                  OR price_type IN ('A', 'B')
               )
             ORDER BY CASE price_type WHEN 'C' THEN 0 WHEN 'P' THEN 1 WHEN 'A' THEN 2 ELSE 3 END,
                      CAST(break_qty AS REAL) DESC,
                      CAST(sales_price AS REAL) ASC
             LIMIT 1",
        ))
        .bind(request.inventory_id.as_str())
        .bind(&request.currency_id)
        .bind(&request.uom)
        .bind(request.as_of.to_string())
        .bind(request.as_of.to_string())
        .bind(request.quantity.to_string())
        .bind(request.customer_id.as_ref().map(CustomerId::as_str))
        .bind(lookup.price_class.map(PriceClassId::as_str))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_from).transpose()
    }

    async fn query_scan(
        &self,
        inventory_id: &InventoryId,
        as_of: NaiveDate,
    ) -> Result<Vec<SalesPriceRow>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS}
             FROM sales_price
             WHERE inventory_id = ?
               AND (effective_date IS NULL OR effective_date <= ?)
               AND (expiration_date IS NULL OR expiration_date >= ?)
             ORDER BY row_id",
        ))
        .bind(inventory_id.as_str())
        .bind(as_of.to_string())
        .bind(as_of.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_from).collect()
    }

    async fn query_rows_for_item(
        &self,
        inventory_id: &InventoryId,
    ) -> Result<Vec<SalesPriceRow>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM sales_price WHERE inventory_id = ? ORDER BY row_id",
        ))
        .bind(inventory_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_from).collect()
    }
}

#[async_trait]
impl SalesPriceCatalog for SqlSalesPriceCatalog {
    async fn find(&self, lookup: &PriceLookup<'_>) -> Result<Option<SalesPriceRow>, SourceError> {
        self.query_find(lookup).await.map_err(source_error)
    }

    async fn scan(
        &self,
        inventory_id: &InventoryId,
        as_of: NaiveDate,
    ) -> Result<Vec<SalesPriceRow>, SourceError> {
        self.query_scan(inventory_id, as_of).await.map_err(source_error)
    }

    async fn rows_for_item(
        &self,
        inventory_id: &InventoryId,
    ) -> Result<Vec<SalesPriceRow>, SourceError> {
        self.query_rows_for_item(inventory_id).await.map_err(source_error)
    }
}

fn row_from(row: &SqliteRow) -> Result<SalesPriceRow, RepositoryError> {
    let row_id_raw: String = row.get("row_id");
    let row_id = Uuid::from_str(&row_id_raw).map_err(|error| RepositoryError::InvalidValue {
        field: "sales_price.row_id".to_string(),
        message: error.to_string(),
    })?;

    let price_type_raw: String = row.get("price_type");
    let price_type = PriceType::from_code(&price_type_raw).ok_or_else(|| {
        RepositoryError::InvalidValue {
            field: "sales_price.price_type".to_string(),
            message: format!("unknown code `{price_type_raw}`"),
        }
    })?;

    Ok(SalesPriceRow {
        row_id,
        inventory_id: InventoryId(row.get("inventory_id")),
        price_type,
        price_code: row.get("price_code"),
        customer_id: row.get::<Option<String>, _>("customer_id").map(CustomerId),
        price_class_id: row.get::<Option<String>, _>("price_class_id").map(PriceClassId),
        uom: row.get("uom"),
        currency_id: row.get("currency_id"),
        break_qty: parse_decimal("sales_price.break_qty", &row.get::<String, _>("break_qty"))?,
        sales_price: parse_decimal(
            "sales_price.sales_price",
            &row.get::<String, _>("sales_price"),
        )?,
        percent_off: parse_optional_decimal(
            "sales_price.percent_off",
            row.get::<Option<String>, _>("percent_off").as_deref(),
        )?,
        effective_date: parse_optional_date(
            "sales_price.effective_date",
            row.get::<Option<String>, _>("effective_date").as_deref(),
        )?,
        expiration_date: parse_optional_date(
            "sales_price.expiration_date",
            row.get::<Option<String>, _>("expiration_date").as_deref(),
        )?,
    })
}

/// Commits a staged cascade plan in one transaction.
pub async fn apply_cascade_plan(
    pool: &DbPool,
    plan: &CascadePlan,
) -> Result<usize, RepositoryError> {
    if plan.updates.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for update in &plan.updates {
        sqlx::query("UPDATE sales_price SET sales_price = ? WHERE row_id = ?")
            .bind(update.new_price.to_string())
            .bind(update.row_id.to_string())
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!(
        item = %plan.inventory_id,
        updated = plan.updates.len(),
        base = %plan.new_base_price,
        "cascade plan committed"
    );
    Ok(plan.updates.len())
}

/// Per-row commit report for a staged batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Inserts staged rows one by one; a failing row is recorded and the batch
/// continues.
pub async fn commit_staged_rows(
    pool: &DbPool,
    rows: &[SalesPriceRow],
) -> Result<CommitSummary, RepositoryError> {
    let mut summary = CommitSummary::default();

    for row in rows {
        let result = sqlx::query(
            "INSERT INTO sales_price (
                 row_id, inventory_id, price_type, price_code, customer_id,
                 price_class_id, uom, currency_id, break_qty, sales_price,
                 percent_off, effective_date, expiration_date
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.row_id.to_string())
        .bind(row.inventory_id.as_str())
        .bind(row.price_type.code())
        .bind(&row.price_code)
        .bind(row.customer_id.as_ref().map(CustomerId::as_str))
        .bind(row.price_class_id.as_ref().map(PriceClassId::as_str))
        .bind(&row.uom)
        .bind(&row.currency_id)
        .bind(row.break_qty.to_string())
        .bind(row.sales_price.to_string())
        .bind(row.percent_off.map(|pct| pct.to_string()))
        .bind(row.effective_date.map(|date| date.to_string()))
        .bind(row.expiration_date.map(|date| date.to_string()))
        .execute(pool)
        .await;

        match result {
            Ok(_) => summary.inserted += 1,
            Err(error) => {
                warn!(row = %row.row_id, %error, "staged row insert failed");
                summary.failed += 1;
                summary.errors.push(format!("row {}: {error}", row.row_id));
            }
        }
    }

    Ok(summary)
}

/// End-to-end copy of one item's active price rows to another: stage with
/// key normalisation, then insert row by row. Failures from both phases are
/// merged; the batch never aborts on a single row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceCopyReport {
    pub selected: usize,
    pub staged: usize,
    pub inserted: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

pub async fn copy_item_prices(
    pool: &DbPool,
    source: &InventoryId,
    target: &InventoryId,
    as_of: NaiveDate,
) -> Result<PriceCopyReport, RepositoryError> {
    let engine = PriceCopyEngine::new(SqlSalesPriceCatalog::new(pool.clone()));
    let outcome = engine.stage_copy(source, target, as_of).await?;
    let summary = commit_staged_rows(pool, &outcome.staged).await?;

    let mut errors = outcome.errors;
    errors.extend(summary.errors);

    Ok(PriceCopyReport {
        selected: outcome.selected,
        staged: outcome.staged.len(),
        inserted: summary.inserted,
        failed: outcome.failed + summary.failed,
        errors,
    })
}
