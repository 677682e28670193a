use std::env;
use std::path::Path;

use pricetier_core::config::{AppConfig, LoadOptions};

/// Prints the effective configuration with per-field source attribution
/// (env > file > default).
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let file_present = Path::new("pricetier.toml").exists();

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.push(render_line(
        "database.url",
        &config.database.url,
        source_of("PRICETIER_DATABASE_URL", file_present),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source_of("PRICETIER_DATABASE_MAX_CONNECTIONS", file_present),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source_of("PRICETIER_DATABASE_TIMEOUT_SECS", file_present),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source_of("PRICETIER_LOG_LEVEL", file_present),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        source_of("PRICETIER_LOG_FORMAT", file_present),
    ));

    lines.join("\n")
}

fn render_line(key: &str, value: &str, source: &'static str) -> String {
    format!("  {key} = {value}  [{source}]")
}

fn source_of(env_key: &str, file_present: bool) -> &'static str {
    if env::var(env_key).is_ok() {
        "env"
    } else if file_present {
        "file"
    } else {
        "default"
    }
}
