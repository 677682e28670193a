pub mod config;
pub mod discount;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use discount::line::{
    customer_discount_pct, sync_line, LineDiscountChanges, LineDiscountState, LineDiscountTrigger,
};
pub use discount::rank::RankTable;
pub use discount::selector::{
    DiscountSequenceMatcher, DiscountSequenceSelector, MatchOptions, RuleApplicabilitySource,
    SelectorConfig,
};
pub use domain::discount::{
    ApplicabilityCombination, DiscountEntity, DiscountId, DiscountRule, DiscountSequenceKey,
};
pub use domain::price_class::{PriceClass, PriceClassId};
pub use domain::sales_price::{
    CustomerId, InventoryId, ItemBasePrice, PriceType, SalesPriceRow,
};
pub use errors::{EngineError, SourceError};
pub use pricing::cascade::{
    percent_off_price, CascadeControl, CascadePlan, PriceCascadeEngine, PriceUpdate,
};
pub use pricing::catalog::{ItemBasePriceSource, PriceLookup, PriceRequest, SalesPriceCatalog};
pub use pricing::copy::{PriceCopyEngine, PriceCopyOutcome};
pub use pricing::hierarchy::{chain_depth, resolve_chain, PriceClassSource};
pub use pricing::resolver::PriceResolver;
pub use pricing::scan::{CatalogScanResolver, MatchedSource, PriceProjection};
