use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::sales_price::InventoryId;

/// Which field edit (or row event) is driving the synchronisation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineDiscountTrigger {
    PercentUpdated,
    AmountUpdated,
    DiscountCodeUpdated,
    ManualFlagUpdated,
    LineInserted,
}

/// Discount-relevant snapshot of one order line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineDiscountState {
    pub inventory_id: Option<InventoryId>,
    pub unit_price: Decimal,
    pub discount_pct: Decimal,
    pub discount_amount: Decimal,
    pub quantity: Decimal,
    pub manual_price: bool,
    pub is_free: bool,
}

/// Field assignments the host applies after a synchronisation pass. `None`
/// leaves the field alone; `revert_to_default_price` asks the host to
/// re-default the unit price from its normal lookup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineDiscountChanges {
    pub discount_pct: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub manual_price: Option<bool>,
    pub revert_to_default_price: bool,
    pub warning: Option<String>,
}

impl LineDiscountChanges {
    pub fn is_noop(&self) -> bool {
        self == &Self::default()
    }
}

/// Keeps a line's discount percent, discount amount, and unit price
/// mutually consistent.
///
/// Clearing either discount field zeroes its companion and reverts the
/// price; an active discount forces the unit price to the item base price
/// and recomputes the companion field from whichever side drove the edit.
/// A missing base price skips the pass with a warning.
pub fn sync_line(
    state: &LineDiscountState,
    trigger: LineDiscountTrigger,
    base_price: Option<Decimal>,
) -> LineDiscountChanges {
    let mut changes = LineDiscountChanges::default();

    if state.is_free {
        return changes;
    }
    let Some(inventory_id) = state.inventory_id.as_ref() else {
        changes.warning = Some("line has no inventory item; discount logic skipped".to_string());
        return changes;
    };

    let cleared = matches!(trigger, LineDiscountTrigger::PercentUpdated if state.discount_pct.is_zero())
        || matches!(trigger, LineDiscountTrigger::AmountUpdated if state.discount_amount.is_zero());

    if cleared {
        if trigger == LineDiscountTrigger::PercentUpdated && !state.discount_amount.is_zero() {
            changes.discount_amount = Some(Decimal::ZERO);
        }
        if trigger == LineDiscountTrigger::AmountUpdated && !state.discount_pct.is_zero() {
            changes.discount_pct = Some(Decimal::ZERO);
        }
        if state.manual_price {
            changes.manual_price = Some(false);
        }
        changes.revert_to_default_price = true;
        return changes;
    }

    if state.discount_pct.is_zero() && state.discount_amount.is_zero() {
        return changes;
    }

    let Some(base_price) = base_price else {
        warn!(item = %inventory_id, "base price not found, discount sync skipped");
        changes.warning =
            Some(format!("base price not found for item {inventory_id}; discount not applied"));
        return changes;
    };

    if state.unit_price != base_price {
        if !state.manual_price {
            changes.manual_price = Some(true);
        }
        changes.unit_price = Some(base_price);
    }

    let (pct_driven, amount_driven) = match trigger {
        LineDiscountTrigger::PercentUpdated => (true, false),
        LineDiscountTrigger::AmountUpdated => (false, true),
        _ => {
            let pct = !state.discount_pct.is_zero();
            (pct, !state.discount_amount.is_zero() && !pct)
        }
    };

    let line_amount = base_price * state.quantity;

    if pct_driven {
        let new_amount = (line_amount * state.discount_pct / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if new_amount != state.discount_amount {
            changes.discount_amount = Some(new_amount);
        }
    } else if amount_driven && !line_amount.is_zero() {
        let new_pct = (state.discount_amount * Decimal::ONE_HUNDRED / line_amount)
            .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero);
        if new_pct != state.discount_pct {
            changes.discount_pct = Some(new_pct);
        }
    }

    changes
}

/// Effective customer discount over the default price:
/// `100 × (1 − unit/default)`, 2 decimal places; zero when there is no
/// positive default to compare against.
pub fn customer_discount_pct(unit_price: Decimal, default_price: Decimal) -> Decimal {
    if default_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (Decimal::ONE_HUNDRED * (Decimal::ONE - unit_price / default_price))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{customer_discount_pct, sync_line, LineDiscountState, LineDiscountTrigger};
    use crate::domain::sales_price::InventoryId;

    fn state(pct: i64, amount_cents: i64) -> LineDiscountState {
        LineDiscountState {
            inventory_id: Some(InventoryId("WIDGET".to_string())),
            unit_price: Decimal::new(12_000, 2),
            discount_pct: Decimal::new(pct, 0),
            discount_amount: Decimal::new(amount_cents, 2),
            quantity: Decimal::TWO,
            manual_price: false,
            is_free: false,
        }
    }

    fn base() -> Option<Decimal> {
        Some(Decimal::new(10_000, 2))
    }

    #[test]
    fn percent_drives_amount_from_the_base_price() {
        let changes = sync_line(&state(10, 0), LineDiscountTrigger::PercentUpdated, base());

        // 100.00 × 2 × 10% = 20.00
        assert_eq!(changes.discount_amount, Some(Decimal::new(2_000, 2)));
        assert_eq!(changes.unit_price, Some(Decimal::new(10_000, 2)));
        assert_eq!(changes.manual_price, Some(true));
        assert!(!changes.revert_to_default_price);
    }

    #[test]
    fn amount_drives_percent_with_six_decimals() {
        let mut input = state(0, 3_333);
        input.unit_price = Decimal::new(10_000, 2);

        let changes = sync_line(&input, LineDiscountTrigger::AmountUpdated, base());

        // 33.33 × 100 / 200.00 = 16.665000
        assert_eq!(changes.discount_pct, Some(Decimal::new(16_665_000, 6)));
    }

    #[test]
    fn clearing_percent_zeroes_amount_and_reverts_price() {
        let mut input = state(0, 1_500);
        input.manual_price = true;

        let changes = sync_line(&input, LineDiscountTrigger::PercentUpdated, base());

        assert_eq!(changes.discount_amount, Some(Decimal::ZERO));
        assert_eq!(changes.manual_price, Some(false));
        assert!(changes.revert_to_default_price);
        assert_eq!(changes.unit_price, None);
    }

    #[test]
    fn clearing_amount_zeroes_percent() {
        let changes = sync_line(&state(15, 0), LineDiscountTrigger::AmountUpdated, base());

        assert_eq!(changes.discount_pct, Some(Decimal::ZERO));
        assert!(changes.revert_to_default_price);
    }

    #[test]
    fn missing_base_price_warns_and_leaves_the_line_alone() {
        let changes = sync_line(&state(10, 0), LineDiscountTrigger::PercentUpdated, None);

        assert!(changes.warning.as_deref().is_some_and(|w| w.contains("base price")));
        assert_eq!(changes.discount_amount, None);
        assert_eq!(changes.unit_price, None);
    }

    #[test]
    fn free_lines_and_lines_without_items_are_skipped() {
        let mut free = state(10, 0);
        free.is_free = true;
        assert!(sync_line(&free, LineDiscountTrigger::PercentUpdated, base()).is_noop());

        let mut no_item = state(10, 0);
        no_item.inventory_id = None;
        let changes = sync_line(&no_item, LineDiscountTrigger::PercentUpdated, base());
        assert!(changes.warning.is_some());
    }

    #[test]
    fn inserted_line_prefers_the_percent_side_when_both_are_set() {
        let changes = sync_line(&state(10, 999), LineDiscountTrigger::LineInserted, base());

        assert_eq!(changes.discount_amount, Some(Decimal::new(2_000, 2)));
        assert_eq!(changes.discount_pct, None);
    }

    #[test]
    fn unchanged_companion_values_are_not_rewritten() {
        let mut input = state(10, 2_000);
        input.unit_price = Decimal::new(10_000, 2);
        input.manual_price = true;

        let changes = sync_line(&input, LineDiscountTrigger::PercentUpdated, base());

        assert!(changes.is_noop());
    }

    #[test]
    fn customer_discount_formula_matches_the_display_field() {
        assert_eq!(
            customer_discount_pct(Decimal::new(8_500, 2), Decimal::new(10_000, 2)),
            Decimal::new(1_500, 2)
        );
        assert_eq!(customer_discount_pct(Decimal::new(8_500, 2), Decimal::ZERO), Decimal::ZERO);
    }
}
