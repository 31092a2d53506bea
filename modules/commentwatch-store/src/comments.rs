use std::collections::HashSet;
use std::path::{Path, PathBuf};

use commentwatch_common::{normalized_key, AnalysisRecord};
use tracing::{info, warn};

use crate::csv_file::{read_rows, write_rows_atomic};
use crate::error::{Result, StoreError};

/// Column order of the comment store file.
pub const COMMENT_COLUMNS: [&str; 4] = ["text", "sentiment", "category", "keyword"];

/// Append-only collection of labeled comments, keyed by normalized text.
///
/// Existing rows are never edited or removed; [`CommentStore::append`] refuses
/// any record whose key is already present.
#[derive(Debug)]
pub struct CommentStore {
    path: PathBuf,
    records: Vec<AnalysisRecord>,
    keys: HashSet<String>,
}

impl CommentStore {
    /// Empty store that will be written to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            keys: HashSet::new(),
        }
    }

    /// Read the whole store. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records: Vec<AnalysisRecord> = read_rows(&path)?;

        let mut keys = HashSet::with_capacity(records.len());
        let mut duplicate_rows = 0usize;
        for record in &records {
            if !keys.insert(record.key()) {
                duplicate_rows += 1;
            }
        }
        let unknown_labels = records.iter().filter(|r| r.sentiment.is_unknown()).count();
        if unknown_labels > 0 {
            // Kept verbatim and written back unchanged on the next persist.
            warn!(path = %path.display(), unknown_labels, "Comment store contains unrecognized sentiment labels");
        }
        if duplicate_rows > 0 {
            // Files written by older versions may carry repeats; keep them as-is.
            warn!(path = %path.display(), duplicate_rows, "Comment store contains duplicate keys");
        }

        info!(path = %path.display(), records = records.len(), "Comment store loaded");
        Ok(Self {
            path,
            records,
            keys,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a comment with this normalized key is already stored.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Append records in order. All-or-nothing: if any record's key is already
    /// stored, or repeats within `records`, nothing is appended.
    pub fn append(&mut self, records: Vec<AnalysisRecord>) -> Result<()> {
        let mut incoming = HashSet::with_capacity(records.len());
        for record in &records {
            let key = record.key();
            if self.keys.contains(&key) || !incoming.insert(key.clone()) {
                return Err(StoreError::DuplicateKey { key });
            }
        }

        self.keys.extend(incoming);
        self.records.extend(records);
        Ok(())
    }

    /// Rewrite the store file with the current contents.
    pub fn persist(&self) -> Result<()> {
        write_rows_atomic(&self.path, &COMMENT_COLUMNS, &self.records)?;
        info!(path = %self.path.display(), records = self.records.len(), "Comment store saved");
        Ok(())
    }
}
