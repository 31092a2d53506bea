use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use commentwatch_common::VideoStatsSnapshot;
use commentwatch_store::StatsStore;

use crate::traits::StatsSource;

/// Appends one statistics snapshot per run, independent of the comment flow.
pub struct StatsRecorder {
    source: Arc<dyn StatsSource>,
}

impl StatsRecorder {
    pub fn new(source: Arc<dyn StatsSource>) -> Self {
        Self { source }
    }

    /// Fetch a snapshot and append it to the store at `path`.
    ///
    /// A failed or empty fetch is skipped without touching the store and
    /// returns `Ok(None)`. Only store I/O errors are returned.
    pub async fn record(&self, path: &Path) -> Result<Option<VideoStatsSnapshot>> {
        let snapshot = match self.source.snapshot().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                info!("No stats snapshot this run");
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "Stats fetch failed, skipping snapshot");
                return Ok(None);
            }
        };

        let mut store = StatsStore::load(path)
            .with_context(|| format!("Failed to load stats store {}", path.display()))?;
        let views_since_last = store
            .latest()
            .map(|prev| snapshot.view_count.saturating_sub(prev.view_count));
        store.append(snapshot.clone());
        store
            .persist()
            .with_context(|| format!("Failed to save stats store {}", path.display()))?;

        info!(
            views = snapshot.view_count,
            likes = snapshot.like_count,
            comments = snapshot.comment_count,
            views_since_last = ?views_since_last,
            rows = store.snapshots().len(),
            "Stats snapshot recorded"
        );
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[tokio::test]
    async fn snapshot_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video_stats.csv");
        let first = snapshot_at("2026-02-14 08:00:00", 100);
        let second = snapshot_at("2026-02-14 08:30:00", 250);

        StatsRecorder::new(Arc::new(MockStatsSource::returning(first.clone())))
            .record(&path)
            .await
            .unwrap();
        let recorded = StatsRecorder::new(Arc::new(MockStatsSource::returning(second.clone())))
            .record(&path)
            .await
            .unwrap();

        assert_eq!(recorded, Some(second.clone()));
        let store = StatsStore::load(&path).unwrap();
        assert_eq!(store.snapshots(), &[first, second]);
    }

    #[tokio::test]
    async fn empty_fetch_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video_stats.csv");

        let recorded = StatsRecorder::new(Arc::new(MockStatsSource::empty()))
            .record(&path)
            .await
            .unwrap();

        assert!(recorded.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_fetch_is_skipped_silently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video_stats.csv");
        let source = Arc::new(MockStatsSource::failing());

        let recorded = StatsRecorder::new(source.clone()).record(&path).await.unwrap();

        assert!(recorded.is_none());
        assert_eq!(source.call_count(), 1);
        assert!(!path.exists());
    }
}
