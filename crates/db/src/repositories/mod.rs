pub mod discount;
pub mod item;
pub mod price_class;
pub mod sales_price;

pub use discount::{SqlDiscountSequenceMatcher, SqlRuleApplicabilitySource};
pub use item::{
    list_item_ids, set_base_price, zero_base_prices, BasePriceChange, SqlItemBasePriceSource,
};
pub use price_class::SqlPriceClassSource;
pub use sales_price::{
    apply_cascade_plan, commit_staged_rows, copy_item_prices, CommitSummary, PriceCopyReport,
    SqlSalesPriceCatalog,
};

use std::str::FromStr;

use chrono::NaiveDate;
use pricetier_core::{EngineError, SourceError};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid stored value for {field}: {message}")]
    InvalidValue { field: String, message: String },
    #[error("engine failure: {0}")]
    Engine(String),
}

impl From<EngineError> for RepositoryError {
    fn from(error: EngineError) -> Self {
        Self::Engine(error.to_string())
    }
}

/// Adapters surface their failures to the engine as plain source errors.
pub(crate) fn source_error(error: RepositoryError) -> SourceError {
    SourceError::unavailable(error.to_string())
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value).map_err(|error| RepositoryError::InvalidValue {
        field: field.to_string(),
        message: error.to_string(),
    })
}

pub(crate) fn parse_optional_decimal(
    field: &str,
    value: Option<&str>,
) -> Result<Option<Decimal>, RepositoryError> {
    value.map(|value| parse_decimal(field, value)).transpose()
}

pub(crate) fn parse_optional_date(
    field: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, RepositoryError> {
    value
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|error| {
                RepositoryError::InvalidValue {
                    field: field.to_string(),
                    message: error.to_string(),
                }
            })
        })
        .transpose()
}
