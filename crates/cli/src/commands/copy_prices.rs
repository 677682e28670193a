use chrono::NaiveDate;
use pricetier_core::InventoryId;
use pricetier_db::repositories::copy_item_prices;
use serde_json::json;

use crate::commands::{with_connected_pool, CommandResult};

pub struct CopyPricesArgs {
    pub from: String,
    pub to: String,
    pub as_of: NaiveDate,
}

pub fn run(args: CopyPricesArgs) -> CommandResult {
    with_connected_pool("copy-prices", |runtime, pool| {
        runtime.block_on(async {
            let report = copy_item_prices(
                &pool,
                &InventoryId(args.from.clone()),
                &InventoryId(args.to.clone()),
                args.as_of,
            )
            .await
            .map_err(|error| ("price_copy", error.to_string(), 5u8))?;
            pool.close().await;

            let message = if report.failed == 0 {
                format!("copied {} active price row(s)", report.inserted)
            } else {
                format!(
                    "copied {} of {} selected row(s), {} failed",
                    report.inserted, report.selected, report.failed
                )
            };

            Ok(CommandResult::success_with(
                "copy-prices",
                message,
                Some(json!({
                    "from": args.from,
                    "to": args.to,
                    "selected": report.selected,
                    "inserted": report.inserted,
                    "failed": report.failed,
                    "errors": report.errors,
                })),
            ))
        })
    })
}
