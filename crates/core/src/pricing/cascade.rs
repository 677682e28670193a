use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::sales_price::{InventoryId, PriceType};
use crate::errors::EngineError;
use crate::pricing::catalog::SalesPriceCatalog;

/// Explicit cascade scope threaded through any call path that could trigger
/// a nested recomputation. Batch workflows that write derived rows
/// themselves (price copy) pass `Suppress`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CascadeControl {
    #[default]
    Apply,
    Suppress,
}

impl CascadeControl {
    pub fn is_suppressed(self) -> bool {
        matches!(self, Self::Suppress)
    }
}

/// One staged write-back: a derived row whose recomputed price differs from
/// the stored value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub row_id: Uuid,
    pub percent_off: Decimal,
    pub previous_price: Decimal,
    pub new_price: Decimal,
}

/// Staged result of one cascade pass. The caller commits `updates`
/// atomically; the engine never writes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CascadePlan {
    pub inventory_id: InventoryId,
    pub new_base_price: Decimal,
    pub updates: Vec<PriceUpdate>,
    pub examined: usize,
}

/// Recomputes every percent-off price row of an item against a new base
/// price. The caller establishes the precondition (base price actually
/// changed) before invoking.
pub struct PriceCascadeEngine<C> {
    catalog: C,
}

impl<C: SalesPriceCatalog> PriceCascadeEngine<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub async fn plan(
        &self,
        inventory_id: &InventoryId,
        new_base_price: Decimal,
    ) -> Result<CascadePlan, EngineError> {
        let rows = self.catalog.rows_for_item(inventory_id).await?;

        let mut updates = Vec::new();
        let mut examined = 0usize;

        for row in rows {
            if row.price_type == PriceType::Base {
                continue;
            }
            examined += 1;

            let Some(percent_off) = row.percent_off else {
                continue;
            };

            let new_price = percent_off_price(new_base_price, percent_off);
            if new_price == row.sales_price {
                continue;
            }

            debug!(
                item = %inventory_id,
                row = %row.row_id,
                %percent_off,
                previous = %row.sales_price,
                new = %new_price,
                "cascade restages derived price"
            );
            updates.push(PriceUpdate {
                row_id: row.row_id,
                percent_off,
                previous_price: row.sales_price,
                new_price,
            });
        }

        Ok(CascadePlan {
            inventory_id: inventory_id.clone(),
            new_base_price,
            updates,
            examined,
        })
    }
}

/// `base × (1 − pct/100)`, rounded to 4 decimal places, midpoints away from
/// zero.
pub fn percent_off_price(base_price: Decimal, percent_off: Decimal) -> Decimal {
    (base_price * (Decimal::ONE - percent_off / Decimal::ONE_HUNDRED))
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}
