use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::price_class::{PriceClass, PriceClassId};
use crate::errors::SourceError;

/// Read access to price class reference data.
#[async_trait]
pub trait PriceClassSource: Send + Sync {
    async fn get(&self, id: &PriceClassId) -> Result<Option<PriceClass>, SourceError>;
}

/// Walks a class's parent chain into an ordered leaf-to-root list.
///
/// The id is appended before its record is fetched, so a class with no
/// stored record still contributes its id and terminates the chain there.
/// A visited set truncates parent cycles; neither case is an error.
pub async fn resolve_chain<S: PriceClassSource + ?Sized>(
    source: &S,
    leaf: Option<&PriceClassId>,
) -> Result<Vec<PriceClassId>, SourceError> {
    let mut chain = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();

    let mut current = leaf.cloned();
    while let Some(id) = current {
        if id.as_str().trim().is_empty() || !visited.insert(id.normalized()) {
            break;
        }
        chain.push(id.clone());

        current = match source.get(&id).await? {
            Some(class) => class.parent_id,
            None => None,
        };
    }

    Ok(chain)
}

/// Position of `class` within a resolved chain, matching without regard to
/// ASCII case. Shallower positions are more specific.
pub fn chain_depth(chain: &[PriceClassId], class: &PriceClassId) -> Option<usize> {
    chain.iter().position(|entry| entry.matches(class))
}
