use crate::commands::{with_connected_pool, CommandResult};

pub fn run() -> CommandResult {
    with_connected_pool("migrate", |runtime, pool| {
        runtime.block_on(async {
            pool.close().await;
            Ok(CommandResult::success("migrate", "database schema is up to date"))
        })
    })
}
