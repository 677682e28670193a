use std::ops::BitOr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscountId(pub String);

impl DiscountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DiscountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One matched discount application instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscountSequenceKey {
    pub discount_id: DiscountId,
    pub sequence_id: String,
}

impl DiscountSequenceKey {
    pub fn new(discount_id: impl Into<String>, sequence_id: impl Into<String>) -> Self {
        Self { discount_id: DiscountId(discount_id.into()), sequence_id: sequence_id.into() }
    }
}

/// A discount rule as the engine sees it: identity plus the two-letter
/// applicability code persisted by the host system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub id: DiscountId,
    pub applicable_to: String,
}

/// One (entity key, applicability code) pair of the candidate entity set
/// handed to discount selection. The key is the customer id, item id, price
/// class id, warehouse id, etc., depending on the code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscountEntity {
    pub key: String,
    pub code: String,
}

impl DiscountEntity {
    pub fn new(key: impl Into<String>, code: impl Into<String>) -> Self {
        Self { key: key.into(), code: code.into() }
    }
}

/// Set of dimensions a discount rule is scoped to, stored as a bitmask so
/// combinations stay cheap to hash and compare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicabilityCombination(u16);

impl ApplicabilityCombination {
    pub const CUSTOMER: Self = Self(1 << 0);
    pub const INVENTORY_ITEM: Self = Self(1 << 1);
    pub const CUSTOMER_PRICE_CLASS: Self = Self(1 << 2);
    pub const INVENTORY_PRICE_CLASS: Self = Self(1 << 3);
    pub const BRANCH: Self = Self(1 << 4);
    pub const WAREHOUSE: Self = Self(1 << 5);
    pub const VENDOR: Self = Self(1 << 6);
    pub const LOCATION: Self = Self(1 << 7);
    pub const UNCONDITIONAL: Self = Self(1 << 8);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Maps a persisted two-letter applicability code to its combination.
    /// Unknown or missing codes fall back to `UNCONDITIONAL`, matching the
    /// host system's mapper.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("CU") => Self::CUSTOMER,
            Some("IN") => Self::INVENTORY_ITEM,
            Some("CE") => Self::CUSTOMER_PRICE_CLASS,
            Some("IE") => Self::INVENTORY_PRICE_CLASS,
            Some("CI") => Self::CUSTOMER | Self::INVENTORY_ITEM,
            Some("CP") => Self::CUSTOMER | Self::INVENTORY_PRICE_CLASS,
            Some("PI") => Self::INVENTORY_ITEM | Self::CUSTOMER_PRICE_CLASS,
            Some("PB") => Self::CUSTOMER_PRICE_CLASS | Self::BRANCH,
            Some("PP") => Self::CUSTOMER_PRICE_CLASS | Self::INVENTORY_PRICE_CLASS,
            Some("CB") => Self::CUSTOMER | Self::BRANCH,
            Some("WH") => Self::WAREHOUSE,
            Some("WC") => Self::CUSTOMER | Self::WAREHOUSE,
            Some("WE") => Self::CUSTOMER_PRICE_CLASS | Self::WAREHOUSE,
            Some("WI") => Self::INVENTORY_ITEM | Self::WAREHOUSE,
            Some("WP") => Self::INVENTORY_PRICE_CLASS | Self::WAREHOUSE,
            Some("BR") => Self::BRANCH,
            Some("VE") => Self::VENDOR,
            Some("VI") => Self::INVENTORY_ITEM | Self::VENDOR,
            Some("VP") => Self::INVENTORY_PRICE_CLASS | Self::VENDOR,
            Some("VL") => Self::LOCATION,
            Some("LI") => Self::INVENTORY_ITEM | Self::LOCATION,
            Some("UN") => Self::UNCONDITIONAL,
            _ => Self::UNCONDITIONAL,
        }
    }
}

impl BitOr for ApplicabilityCombination {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
