use std::collections::HashSet;

use async_trait::async_trait;
use pricetier_core::{
    DiscountEntity, DiscountId, DiscountRule, DiscountSequenceKey, DiscountSequenceMatcher,
    MatchOptions, RuleApplicabilitySource, SourceError,
};
use sqlx::Row;

use crate::repositories::{source_error, RepositoryError};
use crate::DbPool;

/// SQLite-backed discount rule applicability lookup.
pub struct SqlRuleApplicabilitySource {
    pool: DbPool,
}

impl SqlRuleApplicabilitySource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &DiscountId) -> Result<Option<DiscountRule>, RepositoryError> {
        let row = sqlx::query("SELECT id, applicable_to FROM discount WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| DiscountRule {
            id: DiscountId(row.get("id")),
            applicable_to: row.get("applicable_to"),
        }))
    }

    pub async fn rule(&self, id: &DiscountId) -> Result<Option<DiscountRule>, RepositoryError> {
        self.fetch(id).await
    }
}

#[async_trait]
impl RuleApplicabilitySource for SqlRuleApplicabilitySource {
    async fn applicable_to(&self, id: &DiscountId) -> Result<Option<String>, SourceError> {
        Ok(self.fetch(id).await.map_err(source_error)?.map(|rule| rule.applicable_to))
    }
}

/// Entity-key matching over stored discount sequences. This is the
/// repository-backed stand-in for the host's rule-matching subsystem: a
/// sequence is a candidate when any of its (code, key) scopes appears in
/// the entity set.
pub struct SqlDiscountSequenceMatcher {
    pool: DbPool,
}

impl SqlDiscountSequenceMatcher {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn query_matches(
        &self,
        entities: &HashSet<DiscountEntity>,
        options: &MatchOptions,
    ) -> Result<HashSet<DiscountSequenceKey>, RepositoryError> {
        let mut keys = HashSet::new();

        for entity in entities {
            let rows = sqlx::query(
                "SELECT s.discount_id, s.sequence_id
                 FROM discount_sequence s
                 JOIN discount d ON d.id = s.discount_id
                 WHERE s.entity_code = ?
                   AND s.entity_key = ?
                   AND s.active = 1
                   AND (? = 0 OR s.manual = 0)
                   AND (? IS NULL OR d.discount_type = ?)",
            )
            .bind(&entity.code)
            .bind(&entity.key)
            .bind(options.skip_manual as i64)
            .bind(options.discount_type.as_deref())
            .bind(options.discount_type.as_deref())
            .fetch_all(&self.pool)
            .await?;

            for row in rows {
                keys.insert(DiscountSequenceKey {
                    discount_id: DiscountId(row.get("discount_id")),
                    sequence_id: row.get("sequence_id"),
                });
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl DiscountSequenceMatcher for SqlDiscountSequenceMatcher {
    async fn matches(
        &self,
        entities: &HashSet<DiscountEntity>,
        options: &MatchOptions,
    ) -> Result<HashSet<DiscountSequenceKey>, SourceError> {
        self.query_matches(entities, options).await.map_err(source_error)
    }
}
