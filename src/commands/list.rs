//! Flat list commands.
//!
//! - `list`: print deals page by page
//! - `batch`: archive, delete or move a set of deals with one call

use std::time::Duration;

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::interactive::confirm;
use super::{CommandOutput, apply_filter_args, format_amount, resolve_workspace};
use crate::cli::{BatchKind, FilterArgs, OutputOptions};
use crate::config::Config;
use crate::error::{DealboardError, Result};
use crate::filter::{FilterStore, ViewKey};
use crate::list::DealListView;
use crate::remote::{BatchAction, HttpPipelineApi};
use crate::types::{DealId, StageId};

/// A row in the deal list table
#[derive(Tabled)]
struct DealRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

pub async fn cmd_list(
    workspace: Option<&str>,
    archived: bool,
    pages: usize,
    filter: &FilterArgs,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let workspace = resolve_workspace(workspace, &config)?;
    let api = HttpPipelineApi::from_config(&config)?;

    let view = ViewKey {
        archived,
        ..ViewKey::pipeline()
    };
    let filters = FilterStore::new();
    let mut list = DealListView::new(workspace, filters.clone(), config.board.page_size)
        .with_view(view)
        .with_search_debounce(Duration::from_millis(config.search.debounce_ms));
    if let Some(filter) = apply_filter_args(filter, &filters, view)? {
        list.apply_filter(filter)?;
    }

    for _ in 0..pages.max(1) {
        list.load_next(&api).await?;
    }

    let state = list.rows().state();
    let json_output = json!({
        "deals": list.deals(),
        "pagination": state,
    });

    if list.deals().is_empty() {
        return CommandOutput::new(json_output)
            .with_text("No deals found".dimmed().to_string())
            .print(output);
    }

    let rows: Vec<DealRow> = list
        .deals()
        .iter()
        .map(|deal| DealRow {
            id: deal.id.to_string(),
            title: deal.title.clone(),
            customer: deal.customer_name.clone(),
            stage: deal.stage_id.to_string(),
            value: format_amount(deal.deal_value),
            tags: deal.tags.join(", "),
        })
        .collect();

    let mut text = Table::new(rows).with(Style::rounded()).to_string();
    text.push_str(&format!(
        "\nShowing {} of {} deals",
        state.loaded_items, state.total_items
    ));
    if state.has_more {
        text.push_str(&format!(" {}", "(use --pages to load more)".dimmed()));
    }

    CommandOutput::new(json_output).with_text(text).print(output)
}

pub async fn cmd_batch(
    kind: BatchKind,
    ids: &[String],
    stage: Option<&str>,
    yes: bool,
    workspace: Option<&str>,
    output: OutputOptions,
) -> Result<()> {
    let action = match (kind, stage) {
        (BatchKind::Archive, _) => BatchAction::Archive,
        (BatchKind::Delete, _) => BatchAction::Delete,
        (BatchKind::Move, Some(stage)) => BatchAction::MoveStage(StageId::new(stage)),
        (BatchKind::Move, None) => {
            return Err(DealboardError::Other(
                "batch move requires --stage <id>".to_string(),
            ));
        }
    };

    let config = Config::load()?;
    let workspace = resolve_workspace(workspace, &config)?;
    let api = HttpPipelineApi::from_config(&config)?;

    let mut list = DealListView::new(workspace, FilterStore::new(), config.board.page_size);
    for id in ids {
        let id = DealId::new(id.trim());
        if !list.selection().is_selected(&id) {
            list.toggle_select(&id);
        }
    }

    let dialog = list.request_batch(action)?;
    if !yes && !confirm(&dialog.message)? {
        list.cancel_batch();
        return CommandOutput::new(json!({ "action": dialog.action.verb(), "status": "cancelled" }))
            .with_text("Cancelled".dimmed().to_string())
            .print(output);
    }

    list.confirm_batch(&api).await?;

    let message = list
        .take_toast()
        .map(|t| t.message)
        .unwrap_or_else(|| format!("Applied {} to {} deal(s)", dialog.action, dialog.ids.len()));

    CommandOutput::new(json!({
        "action": dialog.action.verb(),
        "ids": dialog.ids,
        "status": "applied",
    }))
    .with_text(message.green().to_string())
    .print(output)
}
