use serde_json::json;

use crate::commands::{with_connected_pool, CommandResult};
use pricetier_db::SeedDataset;

pub fn run() -> CommandResult {
    with_connected_pool("seed", |runtime, pool| {
        runtime.block_on(async {
            let result = SeedDataset::load(&pool)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

            let verification = SeedDataset::verify(&pool)
                .await
                .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

            pool.close().await;

            if !verification.all_present {
                let failed: Vec<&str> = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(*check))
                    .collect();
                return Err((
                    "seed_verification",
                    format!("seed checks failed: {}", failed.join(", ")),
                    6u8,
                ));
            }

            Ok(CommandResult::success_with(
                "seed",
                "deterministic demo dataset loaded",
                Some(json!({
                    "price_classes": result.price_classes,
                    "items": result.items,
                    "price_rows": result.price_rows,
                    "discounts": result.discounts,
                })),
            ))
        })
    })
}
