//! In-memory pipeline API for driving the board and list in tests.

use std::collections::{HashMap, HashSet};

use dealboard::error::{DealboardError, Result};
use dealboard::remote::{DealPage, PageRequest, PipelineApi};
use dealboard::types::{Deal, DealId, Stage, StageId, WorkspaceId};
use parking_lot::Mutex;

#[derive(Default)]
struct MockState {
    stages: Vec<Stage>,
    deals: Vec<Deal>,
    archived: HashSet<DealId>,
    failing: HashSet<String>,
    calls: HashMap<String, usize>,
    page_requests: Vec<PageRequest>,
    batch_calls: Vec<(String, Vec<DealId>)>,
    next_stage: usize,
}

pub struct MockPipelineApi {
    state: Mutex<MockState>,
}

impl MockPipelineApi {
    pub fn new(stages: Vec<Stage>, deals: Vec<Deal>) -> Self {
        Self {
            state: Mutex::new(MockState {
                stages,
                deals,
                ..Default::default()
            }),
        }
    }

    /// Make an operation fail until [`MockPipelineApi::recover`] is called.
    ///
    /// Operations are named after the trait methods; page loads of a single
    /// stage use `page:<stage id>`.
    pub fn fail(&self, operation: &str) {
        self.state.lock().failing.insert(operation.to_string());
    }

    pub fn recover(&self, operation: &str) {
        self.state.lock().failing.remove(operation);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.state.lock().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn page_requests(&self) -> Vec<PageRequest> {
        self.state.lock().page_requests.clone()
    }

    /// Page requests issued for one stage
    pub fn page_requests_for(&self, stage: &str) -> Vec<PageRequest> {
        self.page_requests()
            .into_iter()
            .filter(|r| r.stage_id.as_ref().is_some_and(|s| s.as_str() == stage))
            .collect()
    }

    pub fn batch_calls(&self) -> Vec<(String, Vec<DealId>)> {
        self.state.lock().batch_calls.clone()
    }

    /// Stage a deal is stored in on the server side
    pub fn stage_of(&self, deal: &str) -> Option<StageId> {
        self.state
            .lock()
            .deals
            .iter()
            .find(|d| d.id.as_str() == deal)
            .map(|d| d.stage_id.clone())
    }

    pub fn deal_count(&self) -> usize {
        self.state.lock().deals.len()
    }

    fn record(&self, operation: &str) -> Result<()> {
        let mut state = self.state.lock();
        *state.calls.entry(operation.to_string()).or_default() += 1;
        if state.failing.contains(operation) {
            return Err(DealboardError::Api(format!("{operation} unavailable")));
        }
        Ok(())
    }
}

fn matches(deal: &Deal, request: &PageRequest) -> bool {
    if let Some(stage) = &request.stage_id
        && &deal.stage_id != stage
    {
        return false;
    }
    if let Some(tags) = request.filter.as_ref().and_then(|f| f.tags.as_ref())
        && !deal.tags.iter().any(|t| tags.contains(t))
    {
        return false;
    }
    if let Some(search) = request.filter.as_ref().and_then(|f| f.search.as_ref())
        && !deal.title.to_lowercase().contains(&search.to_lowercase())
    {
        return false;
    }
    true
}

impl PipelineApi for MockPipelineApi {
    async fn fetch_stages(&self, _workspace_id: &WorkspaceId) -> Result<Vec<Stage>> {
        self.record("fetch_stages")?;
        let state = self.state.lock();
        Ok(state
            .stages
            .iter()
            .map(|stage| {
                let deals: Vec<&Deal> = state
                    .deals
                    .iter()
                    .filter(|d| d.stage_id == stage.id && !state.archived.contains(&d.id))
                    .collect();
                Stage {
                    total_deals: deals.len(),
                    budget: deals.iter().map(|d| d.deal_value).sum(),
                    ..stage.clone()
                }
            })
            .collect())
    }

    async fn fetch_deals_page(&self, request: &PageRequest) -> Result<DealPage> {
        self.state.lock().page_requests.push(request.clone());
        self.record("fetch_deals_page")?;
        if let Some(stage) = &request.stage_id {
            self.record(&format!("page:{stage}"))?;
        }

        let state = self.state.lock();
        let matching: Vec<Deal> = state
            .deals
            .iter()
            .filter(|d| state.archived.contains(&d.id) == request.archived)
            .filter(|d| matches(d, request))
            .cloned()
            .collect();
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(request.offset)
            .take(request.page_size)
            .collect();
        Ok(DealPage { items, total })
    }

    async fn move_deal_stage(&self, deal_id: &DealId, stage_id: &StageId) -> Result<()> {
        self.record("move_deal_stage")?;
        let mut state = self.state.lock();
        if let Some(deal) = state.deals.iter_mut().find(|d| &d.id == deal_id) {
            deal.stage_id = stage_id.clone();
        }
        Ok(())
    }

    async fn batch_archive(&self, ids: &[DealId]) -> Result<()> {
        self.record("batch_archive")?;
        let mut state = self.state.lock();
        state.batch_calls.push(("archive".to_string(), ids.to_vec()));
        state.archived.extend(ids.iter().cloned());
        Ok(())
    }

    async fn batch_delete(&self, ids: &[DealId]) -> Result<()> {
        self.record("batch_delete")?;
        let mut state = self.state.lock();
        state.batch_calls.push(("delete".to_string(), ids.to_vec()));
        state.deals.retain(|d| !ids.contains(&d.id));
        Ok(())
    }

    async fn batch_move_stage(&self, ids: &[DealId], stage_id: &StageId) -> Result<()> {
        self.record("batch_move_stage")?;
        let mut state = self.state.lock();
        state.batch_calls.push(("move".to_string(), ids.to_vec()));
        for deal in state.deals.iter_mut().filter(|d| ids.contains(&d.id)) {
            deal.stage_id = stage_id.clone();
        }
        Ok(())
    }

    async fn rename_stage(&self, stage_id: &StageId, title: &str) -> Result<()> {
        self.record("rename_stage")?;
        let mut state = self.state.lock();
        if let Some(stage) = state.stages.iter_mut().find(|s| &s.id == stage_id) {
            stage.title = title.to_string();
        }
        Ok(())
    }

    async fn reorder_stages(&self, _workspace_id: &WorkspaceId, stage_ids: &[StageId]) -> Result<()> {
        self.record("reorder_stages")?;
        let mut state = self.state.lock();
        for stage in state.stages.iter_mut() {
            if let Some(index) = stage_ids.iter().position(|id| id == &stage.id) {
                stage.index = index;
            }
        }
        Ok(())
    }

    async fn delete_stage(&self, stage_id: &StageId) -> Result<()> {
        self.record("delete_stage")?;
        self.state.lock().stages.retain(|s| &s.id != stage_id);
        Ok(())
    }

    async fn create_stage(&self, _workspace_id: &WorkspaceId, title: &str) -> Result<Stage> {
        self.record("create_stage")?;
        let mut state = self.state.lock();
        state.next_stage += 1;
        let stage = Stage {
            id: StageId::new(format!("stage-{}", state.next_stage)),
            index: state.stages.len(),
            title: title.to_string(),
            budget: 0.0,
            total_deals: 0,
        };
        state.stages.push(stage.clone());
        Ok(stage)
    }
}
