//! Mock data builders for creating test deals and stages.

use dealboard::types::{Deal, DealId, Stage, StageId, WorkspaceId};

pub const WORKSPACE: &str = "ws-1";

/// Builder for creating test deals
pub struct DealBuilder {
    deal: Deal,
}

impl DealBuilder {
    /// Create a new deal builder in the given stage
    pub fn new(id: &str, stage: &str) -> Self {
        Self {
            deal: Deal {
                id: DealId::new(id),
                title: format!("Deal {id}"),
                customer_name: "Acme".to_string(),
                deal_value: 1000.0,
                last_modified_date: Some("2026-03-15T10:00:00".to_string()),
                calls_count: 0,
                notes_count: 0,
                reminders_count: 0,
                attachments_count: 0,
                tags: Vec::new(),
                assignees: Vec::new(),
                stage_id: StageId::new(stage),
                workspace_id: WorkspaceId::new(WORKSPACE),
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.deal.title = title.to_string();
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.deal.deal_value = value;
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.deal.tags.push(tag.to_string());
        self
    }

    pub fn build(self) -> Deal {
        self.deal
    }
}

/// A plain deal with no tags
pub fn deal(id: &str, stage: &str) -> Deal {
    DealBuilder::new(id, stage).build()
}

/// `count` deals named `{prefix}-{n}` in one stage, all carrying `tag`
pub fn tagged_deals(prefix: &str, stage: &str, tag: &str, count: usize) -> Vec<Deal> {
    (1..=count)
        .map(|n| DealBuilder::new(&format!("{prefix}-{n}"), stage).tag(tag).build())
        .collect()
}

pub fn stage(id: &str, index: usize, title: &str) -> Stage {
    Stage {
        id: StageId::new(id),
        index,
        title: title.to_string(),
        budget: 0.0,
        total_deals: 0,
    }
}

/// The default three-column pipeline
pub fn default_stages() -> Vec<Stage> {
    vec![
        stage("new", 0, "New"),
        stage("qualified", 1, "Qualified"),
        stage("won", 2, "Won"),
    ]
}
