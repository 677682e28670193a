use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::price_class::PriceClassId;
use crate::domain::sales_price::{InventoryId, PriceType, SalesPriceRow};
use crate::errors::EngineError;
use crate::pricing::catalog::SalesPriceCatalog;

/// Result of staging a batch price copy. Row-level failures are collected
/// and never abort the batch; the caller decides whether zero staged rows
/// is fatal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceCopyOutcome {
    pub selected: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub staged: Vec<SalesPriceRow>,
}

impl PriceCopyOutcome {
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }
}

/// Stages copies of a source item's active price rows for a target item,
/// normalising key fields per price type. The staged rows are committed by
/// the caller under a suppressed cascade scope.
pub struct PriceCopyEngine<C> {
    catalog: C,
}

impl<C: SalesPriceCatalog> PriceCopyEngine<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub async fn stage_copy(
        &self,
        source: &InventoryId,
        target: &InventoryId,
        as_of: NaiveDate,
    ) -> Result<PriceCopyOutcome, EngineError> {
        if source.as_str().trim().is_empty() {
            return Err(EngineError::MissingSourceItem);
        }
        if target.as_str().trim().is_empty() {
            return Err(EngineError::precondition("target item identity is required"));
        }

        let source_rows = self.catalog.scan(source, as_of).await?;
        let selected = source_rows.len();

        let mut staged = Vec::with_capacity(selected);
        let mut errors = Vec::new();

        for row in &source_rows {
            match stage_row(row, target) {
                Ok(copy) => staged.push(copy),
                Err(message) => {
                    warn!(source = %source, row = %row.row_id, %message, "price copy row skipped");
                    errors.push(message);
                }
            }
        }

        let failed = errors.len();
        info!(
            source = %source,
            target = %target,
            selected,
            staged = staged.len(),
            failed,
            "price copy staged"
        );

        Ok(PriceCopyOutcome { selected, failed, errors, staged })
    }
}

/// Builds the target row with a fresh identity and per-type key
/// normalisation: class rows carry the class code in both key fields,
/// customer rows fall back to the customer key for the price code, and
/// base/all-customer rows clear it.
fn stage_row(source: &SalesPriceRow, target: &InventoryId) -> Result<SalesPriceRow, String> {
    let mut copy = source.clone();
    copy.row_id = Uuid::new_v4();
    copy.inventory_id = target.clone();

    match source.price_type {
        PriceType::PriceClassSpecific => {
            let class_code = source
                .price_class_id
                .as_ref()
                .map(|class| class.as_str().to_string())
                .filter(|code| !code.trim().is_empty())
                .or_else(|| {
                    let code = source.price_code.trim();
                    (!code.is_empty()).then(|| code.to_string())
                });
            let Some(code) = class_code else {
                return Err(format!("source price row {} lacks a class code", source.row_id));
            };
            copy.price_class_id = Some(PriceClassId(code.clone()));
            copy.price_code = code;
        }
        PriceType::CustomerSpecific => {
            if source.price_code.trim().is_empty() {
                copy.price_code = source
                    .customer_id
                    .as_ref()
                    .map(|customer| customer.as_str().to_string())
                    .unwrap_or_default();
            }
        }
        PriceType::Base | PriceType::AllCustomers => {
            copy.price_code = String::new();
        }
    }

    Ok(copy)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::PriceCopyEngine;
    use crate::domain::price_class::PriceClassId;
    use crate::domain::sales_price::{CustomerId, InventoryId, PriceType, SalesPriceRow};
    use crate::errors::{EngineError, SourceError};
    use crate::pricing::catalog::{PriceLookup, SalesPriceCatalog};

    struct VecCatalog {
        rows: Vec<SalesPriceRow>,
    }

    #[async_trait]
    impl SalesPriceCatalog for VecCatalog {
        async fn find(
            &self,
            _lookup: &PriceLookup<'_>,
        ) -> Result<Option<SalesPriceRow>, SourceError> {
            Ok(None)
        }

        async fn scan(
            &self,
            _inventory_id: &InventoryId,
            as_of: NaiveDate,
        ) -> Result<Vec<SalesPriceRow>, SourceError> {
            Ok(self.rows.iter().filter(|row| row.is_active_on(as_of)).cloned().collect())
        }

        async fn rows_for_item(
            &self,
            _inventory_id: &InventoryId,
        ) -> Result<Vec<SalesPriceRow>, SourceError> {
            Ok(self.rows.clone())
        }
    }

    fn row(id: u128, price_type: PriceType) -> SalesPriceRow {
        SalesPriceRow {
            row_id: Uuid::from_u128(id),
            inventory_id: InventoryId("WIDGET".to_string()),
            price_type,
            price_code: String::new(),
            customer_id: None,
            price_class_id: None,
            uom: "EA".to_string(),
            currency_id: "USD".to_string(),
            break_qty: Decimal::ZERO,
            sales_price: Decimal::new(1_000, 2),
            percent_off: None,
            effective_date: None,
            expiration_date: None,
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date")
    }

    fn source() -> InventoryId {
        InventoryId("WIDGET".to_string())
    }

    fn target() -> InventoryId {
        InventoryId("WIDGET-2".to_string())
    }

    #[tokio::test]
    async fn copies_active_rows_with_fresh_identity() {
        let mut active = row(1, PriceType::AllCustomers);
        active.effective_date = NaiveDate::from_ymd_opt(2026, 1, 1);
        let mut expired = row(2, PriceType::AllCustomers);
        expired.expiration_date = NaiveDate::from_ymd_opt(2026, 1, 31);

        let engine = PriceCopyEngine::new(VecCatalog { rows: vec![active, expired] });
        let outcome = engine.stage_copy(&source(), &target(), as_of()).await.expect("stage");

        assert_eq!(outcome.selected, 1);
        assert_eq!(outcome.staged_count(), 1);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.staged[0].inventory_id, target());
        assert_ne!(outcome.staged[0].row_id, Uuid::from_u128(1));
    }

    #[tokio::test]
    async fn class_rows_normalise_both_key_fields() {
        let mut class_row = row(1, PriceType::PriceClassSpecific);
        class_row.price_class_id = Some(PriceClassId("GOLD".to_string()));

        let engine = PriceCopyEngine::new(VecCatalog { rows: vec![class_row] });
        let outcome = engine.stage_copy(&source(), &target(), as_of()).await.expect("stage");

        let staged = &outcome.staged[0];
        assert_eq!(staged.price_class_id, Some(PriceClassId("GOLD".to_string())));
        assert_eq!(staged.price_code, "GOLD");
    }

    #[tokio::test]
    async fn class_row_without_any_class_code_is_collected_not_fatal() {
        let broken = row(1, PriceType::PriceClassSpecific);
        let mut good = row(2, PriceType::PriceClassSpecific);
        good.price_code = "SILVER".to_string();

        let engine = PriceCopyEngine::new(VecCatalog { rows: vec![broken, good] });
        let outcome = engine.stage_copy(&source(), &target(), as_of()).await.expect("stage");

        assert_eq!(outcome.selected, 2);
        assert_eq!(outcome.staged_count(), 1);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.errors[0].contains("lacks a class code"));
        assert_eq!(outcome.staged[0].price_code, "SILVER");
    }

    #[tokio::test]
    async fn customer_rows_fall_back_to_the_customer_key() {
        let mut customer_row = row(1, PriceType::CustomerSpecific);
        customer_row.customer_id = Some(CustomerId("ACME".to_string()));

        let engine = PriceCopyEngine::new(VecCatalog { rows: vec![customer_row] });
        let outcome = engine.stage_copy(&source(), &target(), as_of()).await.expect("stage");

        assert_eq!(outcome.staged[0].price_code, "ACME");
        assert_eq!(outcome.staged[0].customer_id, Some(CustomerId("ACME".to_string())));
    }

    #[tokio::test]
    async fn base_and_all_customer_rows_clear_the_price_code() {
        let mut base = row(1, PriceType::Base);
        base.price_code = "stale".to_string();

        let engine = PriceCopyEngine::new(VecCatalog { rows: vec![base] });
        let outcome = engine.stage_copy(&source(), &target(), as_of()).await.expect("stage");

        assert_eq!(outcome.staged[0].price_code, "");
    }

    #[tokio::test]
    async fn missing_source_identity_is_a_hard_error() {
        let engine = PriceCopyEngine::new(VecCatalog { rows: vec![] });
        let error = engine
            .stage_copy(&InventoryId("  ".to_string()), &target(), as_of())
            .await
            .expect_err("missing source");
        assert_eq!(error, EngineError::MissingSourceItem);
    }
}
