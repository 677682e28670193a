use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::price_class::PriceClassId;
use crate::domain::sales_price::{CustomerId, InventoryId, ItemBasePrice, SalesPriceRow};
use crate::errors::SourceError;

/// Context for one sales-price resolution. The same remaining context is
/// replayed against the catalog at every node of the class hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub customer_price_class: Option<PriceClassId>,
    pub order_price_class: Option<PriceClassId>,
    pub customer_id: Option<CustomerId>,
    pub inventory_id: InventoryId,
    pub lot_serial: Option<String>,
    pub site_id: Option<String>,
    pub currency_id: String,
    pub quantity: Decimal,
    pub uom: String,
    pub as_of: NaiveDate,
    pub promotional: bool,
    pub fair_value: bool,
}

impl PriceRequest {
    pub fn lookup_at<'a>(&'a self, price_class: Option<&'a PriceClassId>) -> PriceLookup<'a> {
        PriceLookup { price_class, request: self }
    }
}

/// A single-node catalog query: the request context pinned to one price
/// class of the hierarchy (or none).
#[derive(Clone, Copy, Debug)]
pub struct PriceLookup<'a> {
    pub price_class: Option<&'a PriceClassId>,
    pub request: &'a PriceRequest,
}

/// Read access to candidate sales price rows.
///
/// `find` returns the best candidate at one hierarchy node: an
/// implementation prefers customer-specific over class-specific over
/// all-customer over base rows, honours the active-date window, and picks
/// the largest break quantity not exceeding the requested quantity.
/// `scan` returns every row of an item active at the given date.
#[async_trait]
pub trait SalesPriceCatalog: Send + Sync {
    async fn find(&self, lookup: &PriceLookup<'_>) -> Result<Option<SalesPriceRow>, SourceError>;

    async fn scan(
        &self,
        inventory_id: &InventoryId,
        as_of: NaiveDate,
    ) -> Result<Vec<SalesPriceRow>, SourceError>;

    /// Every row of an item, including expired ones. The cascade rewrites
    /// derived prices regardless of date window.
    async fn rows_for_item(
        &self,
        inventory_id: &InventoryId,
    ) -> Result<Vec<SalesPriceRow>, SourceError>;
}

/// Read access to an item's base price settings.
#[async_trait]
pub trait ItemBasePriceSource: Send + Sync {
    async fn base_price(
        &self,
        inventory_id: &InventoryId,
        currency_id: &str,
    ) -> Result<Option<Decimal>, SourceError>;

    async fn base_prices(
        &self,
        inventory_id: &InventoryId,
    ) -> Result<Vec<ItemBasePrice>, SourceError>;
}
