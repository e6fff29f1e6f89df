use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::date_range::DatePreset;

#[derive(Parser)]
#[command(name = "dealboard")]
#[command(about = "Deal pipeline board for the terminal")]
#[command(version)]
pub struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format shared by all commands
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a date preset into a concrete interval
    Range {
        /// today, yesterday, last-7-days, last-30-days, this-year, last-year, all-time
        #[arg(value_parser = parse_preset)]
        preset: DatePreset,

        /// Anchor day (YYYY-MM-DD, default: the current day)
        #[arg(long)]
        today: Option<String>,
    },

    /// Find the preset matching an interval, or report a custom range
    Detect {
        /// First day (YYYY-MM-DD)
        from: String,

        /// Last day (YYYY-MM-DD)
        to: String,

        /// Anchor day (YYYY-MM-DD, default: the current day)
        #[arg(long)]
        today: Option<String>,
    },

    /// Show the pipeline board
    #[command(visible_alias = "b")]
    Board {
        /// Workspace ID (default: config default_workspace)
        #[arg(short, long)]
        workspace: Option<String>,

        /// Show archived deals
        #[arg(long)]
        archived: bool,

        /// Pages to load per column
        #[arg(long, default_value = "1")]
        pages: usize,

        /// Highlight loaded cards matching this text
        #[arg(long)]
        find: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List deals as a flat list
    #[command(visible_alias = "ls")]
    List {
        /// Workspace ID (default: config default_workspace)
        #[arg(short, long)]
        workspace: Option<String>,

        /// Show archived deals
        #[arg(long)]
        archived: bool,

        /// Pages to load
        #[arg(long, default_value = "1")]
        pages: usize,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Move a deal to another stage
    #[command(visible_alias = "mv")]
    Move {
        /// Deal ID
        deal: String,

        /// Stage the deal is currently in
        #[arg(long)]
        from: String,

        /// Destination stage
        #[arg(long)]
        to: String,

        /// Position in the destination column
        #[arg(long, default_value = "0")]
        index: usize,

        /// Workspace ID (default: config default_workspace)
        #[arg(short, long)]
        workspace: Option<String>,
    },

    /// Archive, delete or move several deals in one call
    Batch {
        #[arg(value_enum)]
        action: BatchKind,

        /// Deal IDs
        #[arg(required = true)]
        ids: Vec<String>,

        /// Destination stage (required for `move`)
        #[arg(long)]
        stage: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Workspace ID (default: config default_workspace)
        #[arg(short, long)]
        workspace: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BatchKind {
    Archive,
    Delete,
    Move,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,

    /// Print one configuration value
    Get {
        /// Key, e.g. api.base_url
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Key, e.g. board.page_size
        key: String,

        /// New value
        value: String,
    },
}

/// Filter facets accepted by `board` and `list`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Date preset
    #[arg(long, value_parser = parse_preset)]
    pub preset: Option<DatePreset>,

    /// First day of a custom range (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Last day of a custom range (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Source (repeatable)
    #[arg(long = "source")]
    pub sources: Vec<String>,

    /// Assignee (repeatable)
    #[arg(long = "assignee")]
    pub assignees: Vec<String>,

    /// Status code (repeatable)
    #[arg(long = "status")]
    pub statuses: Vec<String>,

    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn is_empty(&self) -> bool {
        self.preset.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.tags.is_empty()
            && self.sources.is_empty()
            && self.assignees.is_empty()
            && self.statuses.is_empty()
            && self.search.is_none()
    }
}

fn parse_preset(s: &str) -> Result<DatePreset, String> {
    s.parse().map_err(|_| {
        format!(
            "invalid preset '{s}'. Must be one of: {}",
            DatePreset::ALL
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}
