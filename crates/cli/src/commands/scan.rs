use chrono::NaiveDate;
use pricetier_core::{CatalogScanResolver, InventoryId, MatchedSource, PriceClassId};
use pricetier_db::repositories::{
    list_item_ids, SqlItemBasePriceSource, SqlPriceClassSource, SqlSalesPriceCatalog,
};
use serde_json::json;

use crate::commands::{with_connected_pool, CommandResult};

pub struct ScanArgs {
    pub item: Option<String>,
    pub class: Option<String>,
    pub as_of: NaiveDate,
}

pub fn run(args: ScanArgs) -> CommandResult {
    with_connected_pool("scan", |runtime, pool| {
        runtime.block_on(async {
            let resolver = CatalogScanResolver::new(
                SqlSalesPriceCatalog::new(pool.clone()),
                SqlPriceClassSource::new(pool.clone()),
                SqlItemBasePriceSource::new(pool.clone()),
            );

            let items = match &args.item {
                Some(item) => vec![InventoryId(item.clone())],
                None => list_item_ids(&pool)
                    .await
                    .map_err(|error| ("item_listing", error.to_string(), 5u8))?,
            };

            let class = args.class.clone().map(PriceClassId);
            let projections = resolver
                .project_many(&items, class.as_ref(), args.as_of)
                .await
                .map_err(|error| ("projection", error.to_string(), 5u8))?;
            pool.close().await;

            let rows: Vec<_> = projections
                .iter()
                .map(|projection| {
                    json!({
                        "item": projection.inventory_id.as_str(),
                        "uom": projection.uom,
                        "currency": projection.currency_id,
                        "break_qty": projection.break_qty.to_string(),
                        "sales_price": projection.sales_price.to_string(),
                        "matched": match &projection.matched {
                            MatchedSource::Class(class) => class.as_str().to_string(),
                            MatchedSource::Base => "BASE".to_string(),
                        },
                    })
                })
                .collect();

            Ok(CommandResult::success_with(
                "scan",
                format!("resolved {} price group(s)", rows.len()),
                Some(json!({ "prices": rows })),
            ))
        })
    })
}
