use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceClassId(pub String);

impl PriceClassId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Price class ids are matched without regard to ASCII case throughout
    /// the resolution engine.
    pub fn matches(&self, other: &PriceClassId) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    pub fn normalized(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

impl std::fmt::Display for PriceClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A customer price class. Reference data owned by the host system; the
/// engine only reads it. Parent links form a hierarchy that may, in bad
/// data, contain cycles — traversal tolerates them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceClass {
    pub id: PriceClassId,
    pub parent_id: Option<PriceClassId>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::PriceClassId;

    #[test]
    fn class_ids_match_case_insensitively() {
        let retail = PriceClassId("RETAIL".to_string());
        let retail_lower = PriceClassId("retail".to_string());
        assert!(retail.matches(&retail_lower));
        assert_eq!(retail.normalized(), retail_lower.normalized());
    }
}
