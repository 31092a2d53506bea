use std::path::{Path, PathBuf};

use commentwatch_common::VideoStatsSnapshot;
use tracing::info;

use crate::csv_file::{read_rows, write_rows_atomic};
use crate::error::Result;

/// Column order of the statistics store file.
pub const STATS_COLUMNS: [&str; 5] = [
    "timestamp",
    "view_count",
    "like_count",
    "comment_count",
    "title",
];

/// One snapshot row per collection run, in collection order.
#[derive(Debug)]
pub struct StatsStore {
    path: PathBuf,
    snapshots: Vec<VideoStatsSnapshot>,
}

impl StatsStore {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshots: Vec::new(),
        }
    }

    /// Read the whole store. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshots = read_rows(&path)?;
        Ok(Self { path, snapshots })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshots(&self) -> &[VideoStatsSnapshot] {
        &self.snapshots
    }

    pub fn latest(&self) -> Option<&VideoStatsSnapshot> {
        self.snapshots.last()
    }

    pub fn append(&mut self, snapshot: VideoStatsSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn persist(&self) -> Result<()> {
        write_rows_atomic(&self.path, &STATS_COLUMNS, &self.snapshots)?;
        info!(path = %self.path.display(), rows = self.snapshots.len(), "Stats store saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use commentwatch_common::SNAPSHOT_TIMESTAMP_FORMAT;

    fn snapshot(ts: &str, views: u64) -> VideoStatsSnapshot {
        VideoStatsSnapshot {
            timestamp: NaiveDateTime::parse_from_str(ts, SNAPSHOT_TIMESTAMP_FORMAT).unwrap(),
            view_count: views,
            like_count: 7,
            comment_count: 3,
            title: "국민연금, 기금운용 성과".to_string(),
        }
    }

    #[test]
    fn snapshots_round_trip_in_collection_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video_stats.csv");

        let mut store = StatsStore::load(&path).unwrap();
        assert!(store.latest().is_none());
        store.append(snapshot("2026-02-14 08:00:00", 100));
        store.persist().unwrap();

        let mut store = StatsStore::load(&path).unwrap();
        store.append(snapshot("2026-02-14 08:30:00", 180));
        store.persist().unwrap();

        let store = StatsStore::load(&path).unwrap();
        let views: Vec<u64> = store.snapshots().iter().map(|s| s.view_count).collect();
        assert_eq!(views, vec![100, 180]);
        assert_eq!(store.latest().unwrap().title, "국민연금, 기금운용 성과");
    }

    #[test]
    fn header_matches_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video_stats.csv");
        let mut store = StatsStore::empty(&path);
        store.append(snapshot("2026-02-14 08:00:00", 1));
        store.persist().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,view_count,like_count,comment_count,title")
        );
        assert!(lines.next().unwrap().starts_with("2026-02-14 08:00:00,1,7,3,"));
    }
}
