use pricetier_core::{CascadeControl, InventoryId};
use pricetier_db::repositories::set_base_price;
use rust_decimal::Decimal;
use serde_json::json;

use crate::commands::{with_connected_pool, CommandResult};

pub struct CascadeArgs {
    pub item: String,
    pub currency: String,
    pub price: Decimal,
    pub suppress: bool,
}

pub fn run(args: CascadeArgs) -> CommandResult {
    with_connected_pool("cascade", |runtime, pool| {
        runtime.block_on(async {
            let control =
                if args.suppress { CascadeControl::Suppress } else { CascadeControl::Apply };

            let change = set_base_price(
                &pool,
                &InventoryId(args.item.clone()),
                &args.currency,
                args.price,
                control,
            )
            .await
            .map_err(|error| ("base_price_update", error.to_string(), 5u8))?;
            pool.close().await;

            let message = if change.changed {
                "base price updated"
            } else {
                "base price unchanged, nothing to do"
            };

            Ok(CommandResult::success_with(
                "cascade",
                message,
                Some(json!({
                    "item": args.item,
                    "currency": args.currency,
                    "changed": change.changed,
                    "cascaded_rows": change.cascaded,
                })),
            ))
        })
    })
}
