pub mod commands;

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use commands::cascade::CascadeArgs;
use commands::copy_prices::CopyPricesArgs;
use commands::resolve::ResolveArgs;
use commands::scan::ScanArgs;

#[derive(Debug, Parser)]
#[command(
    name = "pricetier",
    about = "Pricetier operator CLI",
    long_about = "Operate the pricing engine: migrations, demo data, config inspection, \
                  price resolution, catalog projection, and base-price cascades.",
    after_help = "Examples:\n  pricetier resolve --item WIDGET --class GOLD\n  pricetier scan --item WIDGET --class GOLD\n  pricetier cascade --item WIDGET --price 200"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo dataset and verify it")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Resolve the applicable sales price for an item in context")]
    Resolve {
        #[arg(long, help = "Inventory item id")]
        item: String,
        #[arg(long, help = "Customer id")]
        customer: Option<String>,
        #[arg(long = "class", help = "Customer price class id")]
        customer_class: Option<String>,
        #[arg(long = "order-class", help = "Order-level override price class id")]
        order_class: Option<String>,
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long, default_value = "EA")]
        uom: String,
        #[arg(long, default_value = "1")]
        quantity: Decimal,
        #[arg(long = "date", help = "As-of date (YYYY-MM-DD), defaults to today")]
        as_of: Option<NaiveDate>,
    },
    #[command(about = "Project one resolved price per (uom, currency, break qty) group")]
    Scan {
        #[arg(long, help = "Inventory item id; omit to scan every item")]
        item: Option<String>,
        #[arg(long = "class", help = "Requested price class id")]
        class: Option<String>,
        #[arg(long = "date", help = "As-of date (YYYY-MM-DD), defaults to today")]
        as_of: Option<NaiveDate>,
    },
    #[command(about = "Set an item base price and cascade percent-off rows")]
    Cascade {
        #[arg(long, help = "Inventory item id")]
        item: String,
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long, help = "New base price")]
        price: Decimal,
        #[arg(long, help = "Write the base price without cascading derived rows")]
        suppress: bool,
    },
    #[command(about = "Copy one item's active price rows to another item")]
    CopyPrices {
        #[arg(long, help = "Source inventory item id")]
        from: String,
        #[arg(long, help = "Target inventory item id")]
        to: String,
        #[arg(long = "date", help = "As-of date (YYYY-MM-DD), defaults to today")]
        as_of: Option<NaiveDate>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let today = || chrono::Local::now().date_naive();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Resolve {
            item,
            customer,
            customer_class,
            order_class,
            currency,
            uom,
            quantity,
            as_of,
        } => commands::resolve::run(ResolveArgs {
            item,
            customer,
            customer_class,
            order_class,
            currency,
            uom,
            quantity,
            as_of: as_of.unwrap_or_else(today),
        }),
        Command::Scan { item, class, as_of } => commands::scan::run(ScanArgs {
            item,
            class,
            as_of: as_of.unwrap_or_else(today),
        }),
        Command::Cascade { item, currency, price, suppress } => {
            commands::cascade::run(CascadeArgs { item, currency, price, suppress })
        }
        Command::CopyPrices { from, to, as_of } => commands::copy_prices::run(CopyPricesArgs {
            from,
            to,
            as_of: as_of.unwrap_or_else(today),
        }),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = pricetier_core::config::AppConfig::load(Default::default())
            .map(|config| config.logging.level)
            .unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(level)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
