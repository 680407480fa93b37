//! Leaderboard aggregation.

use std::sync::Arc;

use crate::error::QuizError;
use crate::model::{RankingEntry, RANKING_SIZE};
use crate::traits::RankingStore;

/// The `n` best entries by correct total, highest first.
///
/// The sort is stable: entries with equal totals keep their source order.
pub fn top_n(entries: &[RankingEntry], n: usize) -> Vec<RankingEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.correct_total.cmp(&a.correct_total));
    sorted.truncate(n);
    sorted
}

/// Holds the last fetched leaderboard and exposes its top-N view.
pub struct RankingAggregator {
    store: Arc<dyn RankingStore>,
    entries: Vec<RankingEntry>,
    size: usize,
}

impl RankingAggregator {
    pub fn new(store: Arc<dyn RankingStore>) -> Self {
        Self::with_size(store, RANKING_SIZE)
    }

    pub fn with_size(store: Arc<dyn RankingStore>, size: usize) -> Self {
        Self {
            store,
            entries: Vec::new(),
            size,
        }
    }

    /// Fetch the leaderboard from the store.
    ///
    /// On failure the last-known entries stay in place and the error is
    /// returned for display.
    pub async fn refresh(&mut self) -> Result<Vec<RankingEntry>, QuizError> {
        match self.store.fetch_ranking().await {
            Ok(entries) => {
                tracing::debug!(entries = entries.len(), "ranking refreshed");
                self.entries = entries;
                Ok(self.top())
            }
            Err(e) => {
                tracing::warn!("ranking refresh failed, keeping {} known entries: {e}", self.entries.len());
                Err(e.into())
            }
        }
    }

    /// Top entries of the last successful fetch.
    pub fn top(&self) -> Vec<RankingEntry> {
        top_n(&self.entries, self.size)
    }

    /// Entries of the last successful fetch, in source order.
    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn entries(rows: &[(&str, u32)]) -> Vec<RankingEntry> {
        rows.iter().map(|(n, c)| RankingEntry::new(*n, *c)).collect()
    }

    /// Store that replays queued responses.
    struct ScriptedStore {
        responses: Mutex<Vec<Result<Vec<RankingEntry>, ServiceError>>>,
    }

    impl ScriptedStore {
        fn new(mut responses: Vec<Result<Vec<RankingEntry>, ServiceError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl RankingStore for ScriptedStore {
        async fn fetch_ranking(&self) -> Result<Vec<RankingEntry>, ServiceError> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ServiceError::Network("script exhausted".into())))
        }
    }

    #[test]
    fn ties_keep_source_order() {
        let source = entries(&[("Ana", 5), ("Bea", 8), ("Cid", 8), ("Dan", 2)]);
        assert_eq!(
            top_n(&source, 5),
            entries(&[("Bea", 8), ("Cid", 8), ("Ana", 5), ("Dan", 2)])
        );
    }

    #[test]
    fn truncates_to_n() {
        let source = entries(&[("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5), ("f", 6)]);
        let top = top_n(&source, 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].name, "f");
        assert_eq!(top[4].name, "b");
        assert!(top_n(&source, 0).is_empty());
        assert!(top_n(&[], 5).is_empty());
    }

    #[test]
    fn source_is_not_reordered() {
        let source = entries(&[("Ana", 5), ("Bea", 8)]);
        let _ = top_n(&source, 5);
        assert_eq!(source[0].name, "Ana");
    }

    #[tokio::test]
    async fn refresh_failure_keeps_last_known() {
        let store = ScriptedStore::new(vec![
            Ok(entries(&[("Ana", 5), ("Bea", 8)])),
            Err(ServiceError::Status {
                status: 503,
                message: "down".into(),
            }),
        ]);
        let mut aggregator = RankingAggregator::new(Arc::new(store));

        let top = aggregator.refresh().await.unwrap();
        assert_eq!(top[0].name, "Bea");

        let err = aggregator.refresh().await.unwrap_err();
        assert!(matches!(err, QuizError::NetworkFailure(_)));
        assert_eq!(aggregator.top(), entries(&[("Bea", 8), ("Ana", 5)]));
    }

    #[tokio::test]
    async fn refresh_failure_on_first_fetch_leaves_empty() {
        let mut aggregator = RankingAggregator::with_size(Arc::new(ScriptedStore::new(vec![])), 3);
        assert!(aggregator.refresh().await.is_err());
        assert!(aggregator.top().is_empty());
        assert_eq!(aggregator.size(), 3);
    }
}
