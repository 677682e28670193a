use sqlx::{Executor, Row};

use crate::repositories::RepositoryError;
use crate::DbPool;

/// Expected row counts for the seeded tables, checked by `verify`.
const SEED_COUNTS: &[(&str, i64)] = &[
    ("price_class", 7),
    ("inventory_item", 3),
    ("item_base_price", 4),
    ("sales_price", 8),
    ("discount", 3),
    ("discount_sequence", 5),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub price_classes: i64,
    pub items: i64,
    pub price_rows: i64,
    pub discounts: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

/// Deterministic demo dataset: a three-level class chain, a parent cycle
/// for the chain guard, percent-off rows for the cascade, and discounts at
/// several applicability ranks. Reloading replaces the dataset wholesale.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_data.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(Self::SQL).await?;
        tx.commit().await?;

        Ok(SeedResult {
            price_classes: count(pool, "price_class").await?,
            items: count(pool, "inventory_item").await?,
            price_rows: count(pool, "sales_price").await?,
            discounts: count(pool, "discount").await?,
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(SEED_COUNTS.len() + 1);

        for (table, expected) in SEED_COUNTS {
            let actual = count(pool, table).await?;
            checks.push((*table, actual == *expected));
        }

        let cycle_pair: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM price_class
             WHERE (id = 'LOOP-A' AND parent_id = 'LOOP-B')
                OR (id = 'LOOP-B' AND parent_id = 'LOOP-A')",
        )
        .fetch_one(pool)
        .await?
        .get("count");
        checks.push(("price_class_cycle_pair", cycle_pair == 2));

        let percent_off_rows: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM sales_price WHERE percent_off IS NOT NULL",
        )
        .fetch_one(pool)
        .await?
        .get("count");
        checks.push(("percent_off_rows", percent_off_rows == 4));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

async fn count(pool: &DbPool, table: &str) -> Result<i64, RepositoryError> {
    let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(row.get("count"))
}
