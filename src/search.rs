//! Free-text search helpers.
//!
//! [`SearchDebouncer`] holds back server-side search until typing pauses.
//! [`match_deals`] is the client-side quick-find over already loaded cards;
//! it only highlights and never touches pagination.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::config::SearchConfig;
use crate::types::{Deal, DealId};

/// Lets only the most recent keystroke through after a quiet period
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    delay: Duration,
    latest: Arc<AtomicU64>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(Duration::from_millis(config.debounce_ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the debounce window.
    ///
    /// Returns the text when no newer call arrived in the meantime, `None`
    /// when it was superseded.
    pub async fn settle(&self, text: impl Into<String>) -> Option<String> {
        let text = text.into();
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.latest.load(Ordering::SeqCst) == ticket {
            Some(text)
        } else {
            tracing::trace!(ticket, "search input superseded");
            None
        }
    }
}

/// A loaded deal matching the quick-find query
#[derive(Debug, Clone, PartialEq)]
pub struct DealMatch {
    pub deal_id: DealId,
    pub score: i64,
    /// Character positions within the title to highlight
    pub title_indices: Vec<usize>,
}

/// Fuzzy-match loaded deals by title, customer and tags.
///
/// Results are ordered best match first. An empty query matches every deal
/// with a zero score, in the original order.
pub fn match_deals(deals: &[Deal], query: &str) -> Vec<DealMatch> {
    let query = query.trim();
    if query.is_empty() {
        return deals
            .iter()
            .map(|d| DealMatch {
                deal_id: d.id.clone(),
                score: 0,
                title_indices: vec![],
            })
            .collect();
    }

    let matcher = SkimMatcherV2::default().smart_case();

    let mut matches: Vec<DealMatch> = deals
        .iter()
        .filter_map(|deal| {
            let search_text = format!(
                "{} {} {}",
                deal.title,
                deal.customer_name,
                deal.tags.join(" ")
            );
            let title_len = deal.title.chars().count();

            matcher
                .fuzzy_indices(&search_text, query)
                .map(|(score, indices)| DealMatch {
                    deal_id: deal.id.clone(),
                    score,
                    title_indices: indices.into_iter().filter(|&i| i < title_len).collect(),
                })
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}
