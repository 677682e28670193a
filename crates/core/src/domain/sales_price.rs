use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::price_class::PriceClassId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryId(pub String);

impl InventoryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InventoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Price row kind. The single-letter codes are the persisted form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceType {
    Base,
    CustomerSpecific,
    PriceClassSpecific,
    AllCustomers,
}

impl PriceType {
    pub fn code(self) -> &'static str {
        match self {
            Self::Base => "B",
            Self::CustomerSpecific => "C",
            Self::PriceClassSpecific => "P",
            Self::AllCustomers => "A",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(Self::Base),
            "C" => Some(Self::CustomerSpecific),
            "P" => Some(Self::PriceClassSpecific),
            "A" => Some(Self::AllCustomers),
            _ => None,
        }
    }

    /// Customer- and class-specific rows outrank every default/base row
    /// during hierarchy search, regardless of price magnitude.
    pub fn is_specific(self) -> bool {
        matches!(self, Self::CustomerSpecific | Self::PriceClassSpecific)
    }
}

/// One sales price row. `percent_off`, when set, marks the row as derived
/// from the item's base price; the cascade engine keeps `sales_price` in
/// sync after base-price changes. Identity keys are never rewritten by the
/// engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesPriceRow {
    pub row_id: Uuid,
    pub inventory_id: InventoryId,
    pub price_type: PriceType,
    pub price_code: String,
    pub customer_id: Option<CustomerId>,
    pub price_class_id: Option<PriceClassId>,
    pub uom: String,
    pub currency_id: String,
    pub break_qty: Decimal,
    pub sales_price: Decimal,
    pub percent_off: Option<Decimal>,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
}

impl SalesPriceRow {
    /// Active iff the inclusive `[effective_date, expiration_date]` window
    /// contains `as_of`; open ends are unbounded.
    pub fn is_active_on(&self, as_of: NaiveDate) -> bool {
        let started = self.effective_date.map_or(true, |eff| eff <= as_of);
        let not_expired = self.expiration_date.map_or(true, |exp| exp >= as_of);
        started && not_expired
    }
}

/// Per-currency base price settings of an inventory item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemBasePrice {
    pub currency_id: String,
    pub base_unit: String,
    pub base_price: Option<Decimal>,
}
