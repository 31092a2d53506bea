//! One collection-and-classification pass over the watched video.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use commentwatch_common::{AppConfig, FileConfig, StorePaths};
use commentwatch_store::CommentStore;

use crate::classifier::BatchClassifier;
use crate::dedup::new_comments;
use crate::llm::OpenRouterService;
use crate::merge::merge_and_persist;
use crate::prompt::PromptTemplate;
use crate::sources::YouTubeVideo;
use crate::stats::StatsRecorder;
use crate::traits::{ClassificationService, CommentSource, StatsSource};


/// What a single [`Pipeline::run`] did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub snapshot_recorded: bool,
    /// Comment collection failed; the comment store was not touched.
    pub collector_failed: bool,
    pub fetched: usize,
    pub new_comments: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub fallback_records: usize,
    /// Comment store size after the run.
    pub stored_total: usize,
    /// Sentiment counts over the records added this run.
    pub by_sentiment: BTreeMap<String, usize>,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Comment Run Complete ===")?;
        writeln!(f, "Stats snapshot:     {}", if self.snapshot_recorded { "recorded" } else { "skipped" })?;
        if self.collector_failed {
            writeln!(f, "Comments:           collection failed")?;
            return Ok(());
        }
        writeln!(f, "Comments fetched:   {}", self.fetched)?;
        writeln!(f, "New comments:       {}", self.new_comments)?;
        writeln!(f, "Batches sent:       {}", self.batches)?;
        writeln!(f, "Batches failed:     {}", self.failed_batches)?;
        writeln!(f, "Error records:      {}", self.fallback_records)?;
        writeln!(f, "Stored total:       {}", self.stored_total)?;
        if !self.by_sentiment.is_empty() {
            writeln!(f, "\nBy sentiment:")?;
            for (sentiment, count) in &self.by_sentiment {
                writeln!(f, "  {sentiment}: {count}")?;
            }
        }
        Ok(())
    }
}

pub struct Pipeline {
    comments: Arc<dyn CommentSource>,
    stats: StatsRecorder,
    classifier: BatchClassifier,
    paths: StorePaths,
}

impl Pipeline {
    pub fn new(
        comments: Arc<dyn CommentSource>,
        stats: Arc<dyn StatsSource>,
        classifier: BatchClassifier,
        paths: StorePaths,
    ) -> Self {
        Self {
            comments,
            stats: StatsRecorder::new(stats),
            classifier,
            paths,
        }
    }

    /// Wire the YouTube and OpenRouter implementations from loaded config.
    /// Relative paths in `file` resolve against `config_dir`.
    pub fn from_config(
        file: &FileConfig,
        app: &AppConfig,
        config_dir: &Path,
        template: PromptTemplate,
    ) -> Result<Self> {
        let video = Arc::new(YouTubeVideo::new(
            app.youtube_api_key.clone(),
            &file.video.url,
            file.collection.max_comments,
            file.stats.utc_offset_hours,
        )?);
        let service: Arc<dyn ClassificationService> = Arc::new(OpenRouterService::new(
            app.openrouter_api_key.clone(),
            &file.classification,
        ));
        let classifier =
            BatchClassifier::new(service, template, file.classification.batch_size);

        Ok(Self::new(
            video.clone(),
            video,
            classifier,
            file.store_paths(config_dir),
        ))
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Record a stats snapshot, then fetch, dedup, classify and append new
    /// comments.
    ///
    /// Stats problems never stop the comment phase, and a failed comment
    /// fetch ends the run without touching the comment store. Errors are
    /// returned only for comment store I/O.
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();

        match self.stats.record(&self.paths.stats).await {
            Ok(snapshot) => report.snapshot_recorded = snapshot.is_some(),
            Err(e) => warn!(error = %format!("{e:#}"), "Stats snapshot not saved"),
        }

        let fetched = match self.comments.comments().await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Comment collection failed, skipping comment phase");
                report.collector_failed = true;
                return Ok(report);
            }
        };
        report.fetched = fetched.len();

        let mut store = CommentStore::load(&self.paths.comments).with_context(|| {
            format!("Failed to load comment store {}", self.paths.comments.display())
        })?;

        let fresh = new_comments(&fetched, &store);
        report.new_comments = fresh.len();
        info!(
            fetched = report.fetched,
            new = report.new_comments,
            stored = store.len(),
            "Comments deduplicated"
        );

        if fresh.is_empty() {
            info!("No new comments");
            report.stored_total = store.len();
            return Ok(report);
        }

        let run = self.classifier.classify(&fresh).await;
        report.batches = run.batches;
        report.failed_batches = run.failures.len();
        report.fallback_records = run.fallback_records();
        for record in &run.records {
            *report
                .by_sentiment
                .entry(record.sentiment.to_string())
                .or_default() += 1;
        }

        merge_and_persist(&fresh, run.records, &mut store)?;
        report.stored_total = store.len();

        Ok(report)
    }
}
