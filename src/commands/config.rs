//! Configuration commands.
//!
//! - `config show`: display the current configuration
//! - `config get`: print one value
//! - `config set`: change one value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{CONFIG_KEYS, Config};
use crate::error::Result;

pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;

    let mut values = serde_json::Map::new();
    let mut text = format!("{}\n\n", "Configuration:".cyan().bold());
    for key in CONFIG_KEYS {
        let value = config.get(key)?;
        let shown = match &value {
            Some(value) => value.clone(),
            None => "not set".dimmed().to_string(),
        };
        text.push_str(&format!("  {}: {shown}\n", key.cyan()));
        values.insert(key.to_string(), json!(value));
    }
    text.push_str(&format!(
        "\n{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json!({
        "values": values,
        "token_configured": config.api_token().is_some(),
        "config_file": Config::config_path().to_string_lossy(),
    }))
    .with_text(text)
    .print(output)
}

pub fn cmd_config_get(key: &str, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let value = config.get(key)?;

    let text = value.clone().unwrap_or_else(|| "not set".dimmed().to_string());
    CommandOutput::new(json!({ "key": key, "value": value }))
        .with_text(text)
        .print(output)
}

pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;
    tracing::debug!(key, "config updated");

    // Echo the stored form so tokens stay masked
    let shown = config.get(key)?.unwrap_or_default();
    CommandOutput::new(json!({ "key": key, "value": shown }))
        .with_text(format!("Set {} = {}", key.cyan(), shown))
        .print(output)
}
