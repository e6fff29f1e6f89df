//! Date preset commands.
//!
//! - `range`: resolve a preset into an interval
//! - `detect`: find the preset matching an interval

use jiff::civil::Date;
use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, resolve_today};
use crate::cli::OutputOptions;
use crate::date_range::{self, DatePreset, DateRange};
use crate::error::Result;

pub fn cmd_range(preset: DatePreset, today: Option<&str>, output: OutputOptions) -> Result<()> {
    let today = resolve_today(today)?;
    let range = date_range::resolve(preset, today)?;

    let json_output = json!({
        "preset": preset.to_string(),
        "from": range.from.to_string(),
        "to": range.to.to_string(),
    });
    let text = format!(
        "{}: {} .. {}",
        preset.to_string().cyan(),
        range.from.date(),
        range.to.date()
    );

    CommandOutput::new(json_output).with_text(text).print(output)
}

pub fn cmd_detect(from: &str, to: &str, today: Option<&str>, output: OutputOptions) -> Result<()> {
    let today = resolve_today(today)?;
    let range = DateRange::from_days(from.trim().parse::<Date>()?, to.trim().parse::<Date>()?)?;
    let preset = date_range::detect(&range, today);

    let json_output = json!({
        "from": range.from.date().to_string(),
        "to": range.to.date().to_string(),
        "preset": preset.map(|p| p.to_string()),
    });
    let text = match preset {
        Some(preset) => preset.to_string().cyan().to_string(),
        None => "custom".dimmed().to_string(),
    };

    CommandOutput::new(json_output).with_text(text).print(output)
}
