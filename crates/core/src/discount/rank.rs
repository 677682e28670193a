use std::collections::HashMap;

use crate::domain::discount::ApplicabilityCombination;

/// Fixed priority ranking over discount applicability combinations. Lower
/// rank wins; combinations absent from the table rank behind every listed
/// one.
#[derive(Clone, Debug)]
pub struct RankTable {
    ranks: HashMap<ApplicabilityCombination, usize>,
    len: usize,
}

impl RankTable {
    pub fn new(ordered: Vec<ApplicabilityCombination>) -> Self {
        let len = ordered.len();
        let ranks = ordered.into_iter().enumerate().map(|(rank, combo)| (combo, rank)).collect();
        Self { ranks, len }
    }

    pub fn rank(&self, combination: ApplicabilityCombination) -> Option<usize> {
        self.ranks.get(&combination).copied()
    }

    /// Rank with unknown combinations pushed to the very back.
    pub fn rank_or_worst(&self, combination: ApplicabilityCombination) -> usize {
        self.rank(combination).unwrap_or(usize::MAX)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for RankTable {
    fn default() -> Self {
        use ApplicabilityCombination as C;
        Self::new(vec![
            C::CUSTOMER | C::INVENTORY_ITEM,                // CI
            C::CUSTOMER | C::INVENTORY_PRICE_CLASS,         // CP
            C::CUSTOMER | C::BRANCH,                        // CB
            C::CUSTOMER,                                    // CU
            C::CUSTOMER_PRICE_CLASS,                        // CE
            C::CUSTOMER_PRICE_CLASS | C::BRANCH,            // PB
            C::CUSTOMER_PRICE_CLASS | C::INVENTORY_PRICE_CLASS, // PP
            C::INVENTORY_ITEM,                              // IN
            C::INVENTORY_PRICE_CLASS,                       // IE
            C::INVENTORY_ITEM | C::CUSTOMER_PRICE_CLASS,    // PI
            C::WAREHOUSE,                                   // WH
            C::CUSTOMER | C::WAREHOUSE,                     // WC
            C::CUSTOMER_PRICE_CLASS | C::WAREHOUSE,         // WE
            C::INVENTORY_ITEM | C::WAREHOUSE,               // WI
            C::INVENTORY_PRICE_CLASS | C::WAREHOUSE,        // WP
            C::BRANCH,                                      // BR
            C::VENDOR,                                      // VE
            C::INVENTORY_ITEM | C::VENDOR,                  // VI
            C::INVENTORY_PRICE_CLASS | C::VENDOR,           // VP
            C::LOCATION,                                    // VL
            C::INVENTORY_ITEM | C::LOCATION,                // LI
            C::UNCONDITIONAL,                               // UN
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::RankTable;
    use crate::domain::discount::ApplicabilityCombination as C;

    #[test]
    fn table_enumerates_all_known_combinations() {
        let table = RankTable::default();
        assert_eq!(table.len(), 22);
    }

    #[test]
    fn customer_item_outranks_customer_price_class() {
        let table = RankTable::default();
        assert_eq!(table.rank(C::CUSTOMER | C::INVENTORY_ITEM), Some(0));
        assert_eq!(table.rank(C::CUSTOMER_PRICE_CLASS), Some(4));
        assert_eq!(table.rank(C::UNCONDITIONAL), Some(21));
    }

    #[test]
    fn unknown_combination_ranks_behind_everything() {
        let table = RankTable::default();
        let odd = C::VENDOR | C::WAREHOUSE | C::BRANCH;
        assert_eq!(table.rank(odd), None);
        assert_eq!(table.rank_or_worst(odd), usize::MAX);
        assert!(table.rank_or_worst(C::UNCONDITIONAL) < table.rank_or_worst(odd));
    }
}
