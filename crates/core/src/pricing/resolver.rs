use std::collections::HashSet;

use tracing::debug;

use crate::domain::price_class::PriceClassId;
use crate::domain::sales_price::SalesPriceRow;
use crate::errors::EngineError;
use crate::pricing::catalog::{PriceRequest, SalesPriceCatalog};
use crate::pricing::hierarchy::PriceClassSource;

/// Order-aware sales price lookup over the class hierarchy.
///
/// Searches the order-level override class chain before the customer class
/// chain (when they differ), child before parent. The first customer- or
/// class-specific candidate wins outright; the first other candidate seen
/// anywhere is kept as the sole fallback.
pub struct PriceResolver<C, S> {
    catalog: C,
    classes: S,
}

impl<C, S> PriceResolver<C, S>
where
    C: SalesPriceCatalog,
    S: PriceClassSource,
{
    pub fn new(catalog: C, classes: S) -> Self {
        Self { catalog, classes }
    }

    pub async fn find_price(
        &self,
        request: &PriceRequest,
    ) -> Result<Option<SalesPriceRow>, EngineError> {
        let start_classes = start_classes(request);

        let mut visited: HashSet<String> = HashSet::new();
        let mut fallback: Option<SalesPriceRow> = None;

        for root in start_classes {
            let mut next = Some(root);
            while let Some(class) = next {
                if class.as_str().trim().is_empty() || !visited.insert(class.normalized()) {
                    break;
                }

                let candidate = self.catalog.find(&request.lookup_at(Some(&class))).await?;

                if let Some(row) = candidate {
                    if row.price_type.is_specific() {
                        debug!(
                            class = %class,
                            price_type = row.price_type.code(),
                            "specific price match ends hierarchy search"
                        );
                        return Ok(Some(row));
                    }
                    if fallback.is_none() {
                        debug!(class = %class, "remembering first non-specific candidate");
                        fallback = Some(row);
                    }
                }

                next = self.classes.get(&class).await?.and_then(|parent| parent.parent_id);
            }
        }

        Ok(fallback)
    }
}

/// Order override first, then the customer class, skipping the duplicate
/// when both name the same class.
fn start_classes(request: &PriceRequest) -> Vec<PriceClassId> {
    let order = request
        .order_price_class
        .as_ref()
        .filter(|class| !class.as_str().trim().is_empty());
    let customer = request.customer_price_class.as_ref();

    match (order, customer) {
        (Some(order), Some(customer)) if order.matches(customer) => vec![customer.clone()],
        (Some(order), Some(customer)) => vec![order.clone(), customer.clone()],
        (Some(order), None) => vec![order.clone()],
        (None, Some(customer)) => vec![customer.clone()],
        (None, None) => Vec::new(),
    }
}
