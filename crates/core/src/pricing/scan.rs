use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::price_class::PriceClassId;
use crate::domain::sales_price::{InventoryId, PriceType, SalesPriceRow};
use crate::errors::EngineError;
use crate::pricing::catalog::{ItemBasePriceSource, SalesPriceCatalog};
use crate::pricing::hierarchy::{chain_depth, resolve_chain, PriceClassSource};

/// Where a projected price came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchedSource {
    Class(PriceClassId),
    Base,
}

/// One resolved price per (item, uom, currency, break quantity) group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceProjection {
    pub inventory_id: InventoryId,
    pub requested_class: Option<PriceClassId>,
    pub matched: MatchedSource,
    pub uom: String,
    pub currency_id: String,
    pub break_qty: Decimal,
    pub sales_price: Decimal,
}

/// Catalog-scan resolution: for one item and a requested class, collects the
/// class rows along the resolved chain plus base rows (synthesizing base
/// rows from the item's base-price settings when none are stored) and picks
/// one winner per (uom, currency, break quantity) group.
pub struct CatalogScanResolver<C, S, B> {
    catalog: C,
    classes: S,
    base_prices: B,
}

impl<C, S, B> CatalogScanResolver<C, S, B>
where
    C: SalesPriceCatalog,
    S: PriceClassSource,
    B: ItemBasePriceSource,
{
    pub fn new(catalog: C, classes: S, base_prices: B) -> Self {
        Self { catalog, classes, base_prices }
    }

    pub async fn project(
        &self,
        inventory_id: &InventoryId,
        requested_class: Option<&PriceClassId>,
        as_of: NaiveDate,
    ) -> Result<Vec<PriceProjection>, EngineError> {
        let chain = resolve_chain(&self.classes, requested_class).await?;

        let rows = self.catalog.scan(inventory_id, as_of).await?;
        let mut candidates: Vec<SalesPriceRow> = rows
            .into_iter()
            .filter(|row| row.is_active_on(as_of))
            .filter(|row| match row.price_type {
                PriceType::PriceClassSpecific => row
                    .price_class_id
                    .as_ref()
                    .map_or(false, |class| chain_depth(&chain, class).is_some()),
                PriceType::Base => true,
                _ => false,
            })
            .collect();

        if !candidates.iter().any(|row| row.price_type == PriceType::Base) {
            for setting in self.base_prices.base_prices(inventory_id).await? {
                let Some(base_price) = setting.base_price else {
                    continue;
                };
                candidates.push(SalesPriceRow {
                    row_id: Uuid::nil(),
                    inventory_id: inventory_id.clone(),
                    price_type: PriceType::Base,
                    price_code: String::new(),
                    customer_id: None,
                    price_class_id: None,
                    uom: setting.base_unit,
                    currency_id: setting.currency_id,
                    break_qty: Decimal::ZERO,
                    sales_price: base_price,
                    percent_off: None,
                    effective_date: None,
                    expiration_date: None,
                });
            }
        }

        if candidates.is_empty() {
            debug!(item = %inventory_id, "no price candidates, skipping item");
            return Ok(Vec::new());
        }

        // BTreeMap keys give the projection a stable output order, so the
        // same data set always resolves to the same mapping.
        let mut groups: BTreeMap<(String, String, Decimal), Vec<SalesPriceRow>> = BTreeMap::new();
        for row in candidates {
            groups
                .entry((row.uom.clone(), row.currency_id.clone(), row.break_qty))
                .or_default()
                .push(row);
        }

        let projections = groups
            .into_iter()
            .filter_map(|(_, rows)| {
                let winner = rows.into_iter().min_by_key(|row| {
                    (source_rank(row, &chain), row.sales_price)
                })?;
                Some(PriceProjection {
                    inventory_id: winner.inventory_id,
                    requested_class: requested_class.cloned(),
                    matched: match winner.price_class_id {
                        Some(class) if winner.price_type == PriceType::PriceClassSpecific => {
                            MatchedSource::Class(class)
                        }
                        _ => MatchedSource::Base,
                    },
                    uom: winner.uom,
                    currency_id: winner.currency_id,
                    break_qty: winner.break_qty,
                    sales_price: winner.sales_price,
                })
            })
            .collect();

        Ok(projections)
    }

    /// Projects a batch of items in order; items with no candidates simply
    /// contribute nothing.
    pub async fn project_many(
        &self,
        items: &[InventoryId],
        requested_class: Option<&PriceClassId>,
        as_of: NaiveDate,
    ) -> Result<Vec<PriceProjection>, EngineError> {
        let mut projections = Vec::new();
        for item in items {
            projections.extend(self.project(item, requested_class, as_of).await?);
        }
        Ok(projections)
    }
}

/// Class rows rank by chain depth (shallower is more specific); rows whose
/// class fell out of the chain sort just before base rows; base rows always
/// rank last.
fn source_rank(row: &SalesPriceRow, chain: &[PriceClassId]) -> usize {
    if row.price_type == PriceType::Base {
        return usize::MAX;
    }
    row.price_class_id
        .as_ref()
        .and_then(|class| chain_depth(chain, class))
        .unwrap_or(usize::MAX - 1)
}
