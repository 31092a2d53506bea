//! Reconciles classifier output with the original comments and appends it to
//! the comment store. This is the only place the comment store is mutated.

use anyhow::{Context, Result};
use tracing::info;

use commentwatch_common::{AnalysisRecord, CommentWatchError};
use commentwatch_store::CommentStore;

/// Pair `classified[i]` with `new_comments[i]`, forcing each record's text
/// back to the original comment. The model's echoed text is discarded: a
/// trimmed or paraphrased echo would change the comment's dedup identity.
pub fn merge_records(
    new_comments: &[String],
    classified: Vec<AnalysisRecord>,
) -> Result<Vec<AnalysisRecord>, CommentWatchError> {
    if new_comments.len() != classified.len() {
        return Err(CommentWatchError::Integrity(format!(
            "{} classified records for {} new comments",
            classified.len(),
            new_comments.len()
        )));
    }

    Ok(new_comments
        .iter()
        .zip(classified)
        .map(|(original, record)| AnalysisRecord {
            text: original.clone(),
            ..record
        })
        .collect())
}

/// Merge, append in order, and rewrite the store file.
///
/// Nothing is appended or written unless every record merges and appends
/// cleanly. Returns the number of records added.
pub fn merge_and_persist(
    new_comments: &[String],
    classified: Vec<AnalysisRecord>,
    store: &mut CommentStore,
) -> Result<usize> {
    let merged = merge_records(new_comments, classified)?;
    let added = merged.len();

    store
        .append(merged)
        .context("Merged records collide with stored comments")?;
    store
        .persist()
        .with_context(|| format!("Failed to save comment store {}", store.path().display()))?;

    info!(added, total = store.len(), "New comments stored");
    Ok(added)
}
