use chrono::NaiveDate;
use pricetier_core::{
    CustomerId, InventoryId, PriceClassId, PriceRequest, PriceResolver,
};
use pricetier_db::repositories::{SqlPriceClassSource, SqlSalesPriceCatalog};
use rust_decimal::Decimal;
use serde_json::json;

use crate::commands::{with_connected_pool, CommandResult};

pub struct ResolveArgs {
    pub item: String,
    pub customer: Option<String>,
    pub customer_class: Option<String>,
    pub order_class: Option<String>,
    pub currency: String,
    pub uom: String,
    pub quantity: Decimal,
    pub as_of: NaiveDate,
}

pub fn run(args: ResolveArgs) -> CommandResult {
    with_connected_pool("resolve", |runtime, pool| {
        runtime.block_on(async {
            let resolver = PriceResolver::new(
                SqlSalesPriceCatalog::new(pool.clone()),
                SqlPriceClassSource::new(pool.clone()),
            );

            let request = PriceRequest {
                customer_price_class: args.customer_class.clone().map(PriceClassId),
                order_price_class: args.order_class.clone().map(PriceClassId),
                customer_id: args.customer.clone().map(CustomerId),
                inventory_id: InventoryId(args.item.clone()),
                lot_serial: None,
                site_id: None,
                currency_id: args.currency.clone(),
                quantity: args.quantity,
                uom: args.uom.clone(),
                as_of: args.as_of,
                promotional: false,
                fair_value: false,
            };

            let row = resolver
                .find_price(&request)
                .await
                .map_err(|error| ("resolution", error.to_string(), 5u8))?;
            pool.close().await;

            match row {
                Some(row) => Ok(CommandResult::success_with(
                    "resolve",
                    "price resolved",
                    Some(json!({
                        "item": row.inventory_id.as_str(),
                        "price_type": row.price_type.code(),
                        "price_code": row.price_code,
                        "price_class": row.price_class_id.as_ref().map(|c| c.as_str()),
                        "uom": row.uom,
                        "currency": row.currency_id,
                        "break_qty": row.break_qty.to_string(),
                        "sales_price": row.sales_price.to_string(),
                    })),
                )),
                None => Ok(CommandResult::success_with(
                    "resolve",
                    "no applicable price",
                    Some(json!({ "item": args.item })),
                )),
            }
        })
    })
}
