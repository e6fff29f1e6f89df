//! Board commands.
//!
//! - `board`: load every column and print a summary per stage
//! - `move`: drag a deal to another stage

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{CommandOutput, apply_filter_args, format_amount, resolve_workspace};
use crate::board::{BoardSettings, DropEvent, DropOutcome, PageOutcome, PipelineBoard};
use crate::cli::{FilterArgs, OutputOptions};
use crate::config::Config;
use crate::error::{DealboardError, Result};
use crate::filter::{FilterStore, ViewKey};
use crate::remote::{HttpPipelineApi, PipelineApi};
use crate::types::{DealId, StageId};

/// A row in the board summary table
#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    title: String,
    #[tabled(rename = "Deals")]
    deals: String,
    #[tabled(rename = "Budget")]
    budget: String,
    #[tabled(rename = "Cards")]
    cards: String,
}

pub struct BoardOptions<'a> {
    pub workspace: Option<&'a str>,
    pub archived: bool,
    pub pages: usize,
    pub find: Option<&'a str>,
    pub filter: &'a FilterArgs,
}

pub async fn cmd_board(options: BoardOptions<'_>, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let workspace = resolve_workspace(options.workspace, &config)?;
    let api = HttpPipelineApi::from_config(&config)?;

    let view = ViewKey {
        archived: options.archived,
        ..ViewKey::pipeline()
    };
    let filters = FilterStore::new();
    let mut board = PipelineBoard::new(workspace, filters.clone(), BoardSettings::from_config(&config))
        .with_view(view);

    if let Some(filter) = apply_filter_args(options.filter, &filters, view)? {
        board.apply_filter(filter)?;
    }

    board.load_stages(&api).await?;
    load_pages(&mut board, &api, options.pages).await;

    let view_model = board.view_model(options.find.unwrap_or_default());

    let rows: Vec<StageRow> = view_model
        .columns
        .iter()
        .map(|column| {
            let cards = column
                .cards
                .iter()
                .filter(|card| card.matched)
                .map(|card| card.deal.title.clone())
                .collect::<Vec<_>>()
                .join("\n");
            StageRow {
                title: column.stage.title.clone(),
                deals: format!(
                    "{}/{}",
                    column.pagination.loaded_items, column.pagination.total_items
                ),
                budget: format_amount(column.stage.budget),
                cards: match (&column.pagination.last_error, cards.is_empty()) {
                    (Some(error), _) => format!("failed: {error}"),
                    (None, true) => "-".to_string(),
                    (None, false) => cards,
                },
            }
        })
        .collect();

    let mut text = Table::new(rows).with(Style::rounded()).to_string();
    text.push_str(&format!(
        "\n{} deals, budget {}",
        view_model.total_deals,
        format_amount(view_model.total_budget)
    ));
    if let Some(toast) = board.take_toast() {
        text.push_str(&format!("\n{}", toast.message.yellow()));
    }

    CommandOutput::new(serde_json::to_value(&view_model)?)
        .with_text(text)
        .print(output)
}

/// Load up to `pages` pages per column. Columns fail independently.
async fn load_pages<A: PipelineApi>(board: &mut PipelineBoard, api: &A, pages: usize) {
    for _ in 0..pages.max(1) {
        if board.load_initial(api).await.is_err() {
            tracing::debug!("some columns failed to load");
        }
    }
}

pub async fn cmd_move(
    deal: &str,
    from: &str,
    to: &str,
    index: usize,
    workspace: Option<&str>,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let workspace = resolve_workspace(workspace, &config)?;
    let api = HttpPipelineApi::from_config(&config)?;

    let mut board = PipelineBoard::new(workspace, FilterStore::new(), BoardSettings::from_config(&config));
    board.load_stages(&api).await?;

    let deal_id = DealId::new(deal);
    let source = StageId::new(from);
    let dest = StageId::new(to);
    for stage in [&source, &dest] {
        if board.stage(stage).is_none() {
            return Err(DealboardError::StageNotFound(stage.clone()));
        }
    }

    // The deal has to be materialized in its column before it can be dragged
    while board.column(&source).is_some_and(|c| !c.contains(&deal_id)) {
        let outcome = board.load_next(&api, &source).await?;
        if outcome == PageOutcome::Skipped {
            return Err(DealboardError::DealNotFound(deal_id));
        }
    }
    if board.pagination(&dest).is_some_and(|p| p.initial_loading) {
        board.load_next(&api, &dest).await?;
    }

    let drop = DropEvent {
        deal_id: deal_id.clone(),
        source: source.clone(),
        dest: dest.clone(),
        dest_index: index,
    };
    let outcome = board.drop_deal(&api, &drop).await?;

    let (status, text) = match outcome {
        DropOutcome::NoOp => ("unchanged", format!("{} is already there", deal_id.cyan())),
        DropOutcome::Reordered { to, .. } => (
            "reordered",
            format!("Moved {} to position {} in {}", deal_id.cyan(), to, source),
        ),
        DropOutcome::Pending(_) => (
            "moved",
            format!("Moved {} from {} to {}", deal_id.cyan(), source, dest.green()),
        ),
    };

    CommandOutput::new(json!({
        "deal": deal_id,
        "from": source,
        "to": dest,
        "status": status,
    }))
    .with_text(text)
    .print(output)
}
