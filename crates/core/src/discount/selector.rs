use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::debug;

use crate::discount::rank::RankTable;
use crate::domain::discount::{
    ApplicabilityCombination, DiscountEntity, DiscountId, DiscountSequenceKey,
};
use crate::domain::price_class::PriceClassId;
use crate::errors::{EngineError, SourceError};

/// Lookup of a discount rule's persisted applicability code.
#[async_trait]
pub trait RuleApplicabilitySource: Send + Sync {
    async fn applicable_to(&self, id: &DiscountId) -> Result<Option<String>, SourceError>;
}

/// The pre-existing rule-matching subsystem: produces raw candidate
/// sequence keys from an entity set. The selector layers class substitution
/// and ranking on top of it and does not reimplement it.
#[async_trait]
pub trait DiscountSequenceMatcher: Send + Sync {
    async fn matches(
        &self,
        entities: &HashSet<DiscountEntity>,
        options: &MatchOptions,
    ) -> Result<HashSet<DiscountSequenceKey>, SourceError>;
}

/// Pass-through matching context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub discount_type: Option<String>,
    pub skip_manual: bool,
    pub applied_to_deferred_revenue: bool,
}

/// Which entity codes depend on the customer price class, and which code is
/// synthesized when the swap leaves none behind. Configuration data: new
/// applicability codes are added here, not in selector logic.
#[derive(Clone, Debug)]
pub struct SelectorConfig {
    pub price_class_aware_codes: HashSet<String>,
    pub synthesized_code: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            price_class_aware_codes: ["CE", "PB", "PP", "PI", "WE", "CP"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            synthesized_code: "CE".to_string(),
        }
    }
}

/// Selects the applicable discount sequences for a set of order entities.
///
/// With an order-level override class set, price-class-aware entities are
/// re-keyed to the override before matching; an empty result retries with
/// the original entities. Equally-matched survivors are narrowed to the
/// best applicability rank.
pub struct DiscountSequenceSelector<M, R> {
    matcher: M,
    rules: R,
    rank_table: RankTable,
    config: SelectorConfig,
}

impl<M, R> DiscountSequenceSelector<M, R>
where
    M: DiscountSequenceMatcher,
    R: RuleApplicabilitySource,
{
    pub fn new(matcher: M, rules: R) -> Self {
        Self::with_config(matcher, rules, RankTable::default(), SelectorConfig::default())
    }

    pub fn with_config(
        matcher: M,
        rules: R,
        rank_table: RankTable,
        config: SelectorConfig,
    ) -> Self {
        Self { matcher, rules, rank_table, config }
    }

    pub async fn select(
        &self,
        entities: &HashSet<DiscountEntity>,
        order_price_class: Option<&PriceClassId>,
        options: &MatchOptions,
    ) -> Result<HashSet<DiscountSequenceKey>, EngineError> {
        let override_class =
            order_price_class.filter(|class| !class.as_str().trim().is_empty());

        let sequences = match override_class {
            None => self.matcher.matches(entities, options).await?,
            Some(class) => {
                let swapped = self.swap_entities(entities, class);
                debug!(
                    order_class = %class,
                    swapped = swapped.len(),
                    "matching with price-class entities re-keyed to the order class"
                );
                let matched = self.matcher.matches(&swapped, options).await?;
                if matched.is_empty() {
                    debug!("no sequences matched swapped entities, retrying with originals");
                    self.matcher.matches(entities, options).await?
                } else {
                    matched
                }
            }
        };

        self.select_best(sequences).await
    }

    /// Keeps only the candidates sharing the minimum applicability rank.
    /// Sets of size zero or one skip ranking entirely; rank ties all
    /// survive.
    pub async fn select_best(
        &self,
        candidates: HashSet<DiscountSequenceKey>,
    ) -> Result<HashSet<DiscountSequenceKey>, EngineError> {
        if candidates.len() <= 1 {
            return Ok(candidates);
        }

        // The same discount id recurs across sequences; resolve its
        // applicability once per selection cycle.
        let mut cache: HashMap<DiscountId, ApplicabilityCombination> = HashMap::new();
        let mut ranked = Vec::with_capacity(candidates.len());

        for key in candidates {
            let combination = match cache.get(&key.discount_id) {
                Some(combination) => *combination,
                None => {
                    let code = self.rules.applicable_to(&key.discount_id).await?;
                    let combination = ApplicabilityCombination::from_code(code.as_deref());
                    cache.insert(key.discount_id.clone(), combination);
                    combination
                }
            };
            ranked.push((self.rank_table.rank_or_worst(combination), key));
        }

        let best = ranked.iter().map(|(rank, _)| *rank).min().unwrap_or(usize::MAX);
        debug!(best_rank = best, "narrowing candidates to best applicability rank");

        Ok(ranked.into_iter().filter(|(rank, _)| *rank == best).map(|(_, key)| key).collect())
    }

    fn swap_entities(
        &self,
        entities: &HashSet<DiscountEntity>,
        order_class: &PriceClassId,
    ) -> HashSet<DiscountEntity> {
        let mut swapped: HashSet<DiscountEntity> = entities
            .iter()
            .map(|entity| {
                if self.config.price_class_aware_codes.contains(&entity.code) {
                    DiscountEntity::new(order_class.as_str(), entity.code.clone())
                } else {
                    entity.clone()
                }
            })
            .collect();

        if !swapped.iter().any(|entity| entity.code == self.config.synthesized_code) {
            swapped.insert(DiscountEntity::new(
                order_class.as_str(),
                self.config.synthesized_code.clone(),
            ));
        }

        swapped
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{
        DiscountSequenceMatcher, DiscountSequenceSelector, MatchOptions, RuleApplicabilitySource,
    };
    use crate::domain::discount::{DiscountEntity, DiscountId, DiscountSequenceKey};
    use crate::domain::price_class::PriceClassId;
    use crate::errors::SourceError;

    /// Returns the configured result per successive call and records every
    /// entity set it was given.
    struct ScriptedMatcher {
        results: Mutex<Vec<HashSet<DiscountSequenceKey>>>,
        calls: Mutex<Vec<HashSet<DiscountEntity>>>,
    }

    impl ScriptedMatcher {
        fn new(results: Vec<HashSet<DiscountSequenceKey>>) -> Self {
            Self { results: Mutex::new(results), calls: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> Vec<HashSet<DiscountEntity>> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl DiscountSequenceMatcher for ScriptedMatcher {
        async fn matches(
            &self,
            entities: &HashSet<DiscountEntity>,
            _options: &MatchOptions,
        ) -> Result<HashSet<DiscountSequenceKey>, SourceError> {
            self.calls.lock().expect("calls lock").push(entities.clone());
            let mut results = self.results.lock().expect("results lock");
            if results.is_empty() {
                Ok(HashSet::new())
            } else {
                Ok(results.remove(0))
            }
        }
    }

    struct MapRules {
        codes: HashMap<String, String>,
        lookups: Mutex<Vec<String>>,
    }

    impl MapRules {
        fn new(codes: &[(&str, &str)]) -> Self {
            Self {
                codes: codes
                    .iter()
                    .map(|(id, code)| (id.to_string(), code.to_string()))
                    .collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }

        fn lookups(&self) -> usize {
            self.lookups.lock().expect("lookups lock").len()
        }
    }

    #[async_trait]
    impl RuleApplicabilitySource for MapRules {
        async fn applicable_to(&self, id: &DiscountId) -> Result<Option<String>, SourceError> {
            self.lookups.lock().expect("lookups lock").push(id.as_str().to_string());
            Ok(self.codes.get(id.as_str()).cloned())
        }
    }

    fn keys(raw: &[(&str, &str)]) -> HashSet<DiscountSequenceKey> {
        raw.iter().map(|(discount, sequence)| DiscountSequenceKey::new(*discount, *sequence)).collect()
    }

    fn entities(raw: &[(&str, &str)]) -> HashSet<DiscountEntity> {
        raw.iter().map(|(key, code)| DiscountEntity::new(*key, *code)).collect()
    }

    fn order_class() -> PriceClassId {
        PriceClassId("PROMO".to_string())
    }

    #[tokio::test]
    async fn no_override_matches_original_entities_once() {
        let matcher = ScriptedMatcher::new(vec![keys(&[("VOLUME", "1")])]);
        let rules = MapRules::new(&[]);
        let selector = DiscountSequenceSelector::new(matcher, rules);

        let input = entities(&[("ACME", "CU"), ("RETAIL", "CE")]);
        let result =
            selector.select(&input, None, &MatchOptions::default()).await.expect("select");

        assert_eq!(result, keys(&[("VOLUME", "1")]));
        assert_eq!(selector.matcher.calls(), vec![input]);
    }

    #[tokio::test]
    async fn override_swaps_price_class_aware_entities() {
        let matcher = ScriptedMatcher::new(vec![keys(&[("VOLUME", "1")])]);
        let rules = MapRules::new(&[]);
        let selector = DiscountSequenceSelector::new(matcher, rules);

        let input = entities(&[("ACME", "CU"), ("RETAIL", "CE"), ("RETAIL", "PB")]);
        selector
            .select(&input, Some(&order_class()), &MatchOptions::default())
            .await
            .expect("select");

        let calls = selector.matcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            entities(&[("ACME", "CU"), ("PROMO", "CE"), ("PROMO", "PB")])
        );
    }

    #[tokio::test]
    async fn override_synthesizes_missing_price_class_entity() {
        let matcher = ScriptedMatcher::new(vec![keys(&[("VOLUME", "1")])]);
        let rules = MapRules::new(&[]);
        let selector = DiscountSequenceSelector::new(matcher, rules);

        let input = entities(&[("ACME", "CU"), ("WIDGET", "IN")]);
        selector
            .select(&input, Some(&order_class()), &MatchOptions::default())
            .await
            .expect("select");

        let calls = selector.matcher.calls();
        assert_eq!(
            calls[0],
            entities(&[("ACME", "CU"), ("WIDGET", "IN"), ("PROMO", "CE")])
        );
    }

    #[tokio::test]
    async fn empty_swapped_result_falls_back_to_original_entities() {
        let matcher =
            ScriptedMatcher::new(vec![HashSet::new(), keys(&[("LEGACY", "9")])]);
        let rules = MapRules::new(&[]);
        let selector = DiscountSequenceSelector::new(matcher, rules);

        let input = entities(&[("RETAIL", "CE")]);
        let result = selector
            .select(&input, Some(&order_class()), &MatchOptions::default())
            .await
            .expect("select");

        assert_eq!(result, keys(&[("LEGACY", "9")]));
        let calls = selector.matcher.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], entities(&[("PROMO", "CE")]));
        assert_eq!(calls[1], input);
    }

    #[tokio::test]
    async fn best_rank_candidates_survive_and_ties_are_kept() {
        let matcher = ScriptedMatcher::new(vec![keys(&[
            ("ITEMDEAL", "1"),
            ("ITEMDEAL", "2"),
            ("CLASSDEAL", "1"),
        ])]);
        // Customer+InventoryItem ranks 0, CustomerPriceClass ranks 4.
        let rules = MapRules::new(&[("ITEMDEAL", "CI"), ("CLASSDEAL", "CE")]);
        let selector = DiscountSequenceSelector::new(matcher, rules);

        let result = selector
            .select(&entities(&[("ACME", "CU")]), None, &MatchOptions::default())
            .await
            .expect("select");

        assert_eq!(result, keys(&[("ITEMDEAL", "1"), ("ITEMDEAL", "2")]));
    }

    #[tokio::test]
    async fn applicability_is_looked_up_once_per_discount() {
        let matcher = ScriptedMatcher::new(vec![keys(&[
            ("ITEMDEAL", "1"),
            ("ITEMDEAL", "2"),
            ("ITEMDEAL", "3"),
            ("CLASSDEAL", "1"),
        ])]);
        let rules = MapRules::new(&[("ITEMDEAL", "CI"), ("CLASSDEAL", "CE")]);
        let selector = DiscountSequenceSelector::new(matcher, rules);

        selector
            .select(&entities(&[("ACME", "CU")]), None, &MatchOptions::default())
            .await
            .expect("select");

        assert_eq!(selector.rules.lookups(), 2);
    }

    #[tokio::test]
    async fn singleton_and_empty_sets_skip_ranking() {
        let matcher = ScriptedMatcher::new(vec![keys(&[("ONLY", "1")])]);
        let rules = MapRules::new(&[]);
        let selector = DiscountSequenceSelector::new(matcher, rules);

        let result = selector
            .select(&entities(&[("ACME", "CU")]), None, &MatchOptions::default())
            .await
            .expect("select");

        assert_eq!(result, keys(&[("ONLY", "1")]));
        assert_eq!(selector.rules.lookups(), 0);
    }

    #[tokio::test]
    async fn missing_rule_maps_to_unconditional_and_ties_with_it() {
        let matcher =
            ScriptedMatcher::new(vec![keys(&[("MYSTERY", "1"), ("UNCOND", "1")])]);
        // MYSTERY has no stored rule, mapping to Unconditional like UNCOND;
        // both then share rank 21 and both survive.
        let rules = MapRules::new(&[("UNCOND", "UN")]);
        let selector = DiscountSequenceSelector::new(matcher, rules);

        let result = selector
            .select(&entities(&[("ACME", "CU")]), None, &MatchOptions::default())
            .await
            .expect("select");

        assert_eq!(result, keys(&[("MYSTERY", "1"), ("UNCOND", "1")]));
    }
}
