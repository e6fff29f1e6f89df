mod board;
mod config;
pub mod interactive;
mod list;
mod range;

pub use board::{BoardOptions, cmd_board, cmd_move};
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use list::{cmd_batch, cmd_list};
pub use range::{cmd_detect, cmd_range};

use jiff::civil::Date;
use serde_json::Value;

use crate::cli::{FilterArgs, OutputOptions};
use crate::config::Config;
use crate::date_range::{self, DateRange};
use crate::error::{DealboardError, Result};
use crate::filter::{Filter, FilterDraft, FilterStore, ViewKey};
use crate::types::WorkspaceId;

/// Output of a command in both machine and human form
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print JSON when requested, the text form otherwise
    pub fn print(self, output: OutputOptions) -> Result<()> {
        match self.text {
            Some(text) if !output.json => println!("{text}"),
            _ => print_json(&self.json)?,
        }
        Ok(())
    }
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Workspace from the command line, falling back to the configured default
pub(crate) fn resolve_workspace(arg: Option<&str>, config: &Config) -> Result<WorkspaceId> {
    arg.map(str::to_string)
        .or_else(|| config.default_workspace.clone())
        .map(WorkspaceId::new)
        .ok_or_else(|| {
            DealboardError::Config(
                "no workspace given. Pass --workspace or run `dealboard config set default_workspace <id>`"
                    .to_string(),
            )
        })
}

/// Anchor day from `--today`, or the system calendar day
pub(crate) fn resolve_today(arg: Option<&str>) -> Result<Date> {
    match arg {
        Some(text) => Ok(text.trim().parse::<Date>()?),
        None => Ok(date_range::today()),
    }
}

/// Apply the command-line filter facets to the view, if any were given
pub(crate) fn apply_filter_args(
    args: &FilterArgs,
    store: &FilterStore,
    view: ViewKey,
) -> Result<Option<Filter>> {
    if args.is_empty() {
        return Ok(None);
    }

    let today = store.today();
    let mut draft = FilterDraft::from_filter(&store.get_current(view)?);
    if let Some(preset) = args.preset {
        draft.set_preset(preset, today)?;
    }
    if args.from.is_some() || args.to.is_some() {
        let current = draft.clone().into_filter().date_range;
        let from = match &args.from {
            Some(from) => from.parse::<Date>()?,
            None => current.from.date(),
        };
        let to = match &args.to {
            Some(to) => to.parse::<Date>()?,
            None => current.to.date(),
        };
        draft.set_range(DateRange::from_days(from, to)?, today);
    }
    for tag in &args.tags {
        draft.toggle_tag(tag);
    }
    for source in &args.sources {
        draft.toggle_source(source);
    }
    for assignee in &args.assignees {
        draft.toggle_assignee(assignee);
    }
    for status in &args.statuses {
        draft.toggle_status(status);
    }
    if let Some(search) = &args.search {
        draft.set_search(search.clone());
    }
    Ok(Some(draft.into_filter()))
}

/// Format a money amount with thousands separators
pub(crate) fn format_amount(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
