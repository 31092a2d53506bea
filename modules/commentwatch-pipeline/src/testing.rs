// Test mocks for the comment pipeline.
//
// Three mocks matching the three trait boundaries:
// - MockClassifier (ClassificationService): scripted responses, then optional auto-labeling
// - MockCommentSource (CommentSource): fixed comment list or a fixed error
// - MockStatsSource (StatsSource): fixed snapshot, nothing, or an error
//
// Plus helpers for templates and snapshots.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ai_client::AiError;
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;

use commentwatch_common::{Sentiment, VideoStatsSnapshot, SNAPSHOT_TIMESTAMP_FORMAT};

use crate::prompt::PromptTemplate;
use crate::traits::{ClassificationService, CommentSource, StatsSource};

/// Template whose rendered prompt is exactly the JSON array of the chunk.
/// [`MockClassifier`] relies on this to see which comments it was sent.
pub fn bare_template() -> PromptTemplate {
    PromptTemplate::parse("{{comments}}").expect("bare template parses")
}

pub fn snapshot_at(ts: &str, view_count: u64) -> VideoStatsSnapshot {
    VideoStatsSnapshot {
        timestamp: NaiveDateTime::parse_from_str(ts, SNAPSHOT_TIMESTAMP_FORMAT)
            .expect("valid test timestamp"),
        view_count,
        like_count: view_count / 10,
        comment_count: view_count / 100,
        title: "국민연금 기금운용 설명회".to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockClassifier
// ---------------------------------------------------------------------------

/// Records every prompt it receives. Each call pops the next scripted
/// response; once the script is exhausted it either labels the chunk with a
/// fixed sentiment (see [`MockClassifier::labeling`]) or fails.
///
/// Auto-labeled records echo a paraphrase of each comment, never the exact
/// text, so callers can check the original text wins.
pub struct MockClassifier {
    credential: bool,
    scripted: Mutex<VecDeque<std::result::Result<String, AiError>>>,
    auto_label: Option<Sentiment>,
    prompts: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            credential: true,
            scripted: Mutex::new(VecDeque::new()),
            auto_label: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn labeling(sentiment: Sentiment) -> Self {
        Self {
            auto_label: Some(sentiment),
            ..Self::new()
        }
    }

    pub fn without_credential() -> Self {
        Self {
            credential: false,
            ..Self::new()
        }
    }

    pub fn respond_with(self, body: &str) -> Self {
        self.scripted.lock().unwrap().push_back(Ok(body.to_string()));
        self
    }

    pub fn fail_with(self, err: AiError) -> Self {
        self.scripted.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Comments sent per call, decoded from prompts rendered by [`bare_template`].
    pub fn chunks(&self) -> Vec<Vec<String>> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|p| serde_json::from_str(p).expect("prompt rendered from bare_template"))
            .collect()
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunks().iter().map(Vec::len).collect()
    }

    fn label(sentiment: &Sentiment, prompt: &str) -> std::result::Result<String, AiError> {
        let chunk: Vec<String> =
            serde_json::from_str(prompt).map_err(|e| AiError::Parse(e.to_string()))?;
        let data: Vec<serde_json::Value> = chunk
            .iter()
            .map(|text| {
                serde_json::json!({
                    "text": format!("{} (paraphrased)", text.trim()),
                    "sentiment": sentiment,
                    "category": "policy",
                    "keyword": "연금",
                })
            })
            .collect();
        Ok(serde_json::json!({ "data": data }).to_string())
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassificationService for MockClassifier {
    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn complete_json(&self, prompt: &str) -> std::result::Result<String, AiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(scripted) = self.scripted.lock().unwrap().pop_front() {
            return scripted;
        }
        match &self.auto_label {
            Some(sentiment) => Self::label(sentiment, prompt),
            None => Err(AiError::Network("MockClassifier: no scripted response".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// MockCommentSource
// ---------------------------------------------------------------------------

pub struct MockCommentSource {
    comments: Mutex<Vec<String>>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockCommentSource {
    pub fn new(comments: &[&str]) -> Self {
        Self {
            comments: Mutex::new(comments.iter().map(|c| c.to_string()).collect()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    /// Replace what the next fetch returns, as if new comments were posted.
    pub fn set_comments(&self, comments: &[&str]) {
        *self.comments.lock().unwrap() = comments.iter().map(|c| c.to_string()).collect();
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentSource for MockCommentSource {
    async fn comments(&self) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("MockCommentSource: quota exceeded");
        }
        Ok(self.comments.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// MockStatsSource
// ---------------------------------------------------------------------------

pub struct MockStatsSource {
    snapshot: Option<VideoStatsSnapshot>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockStatsSource {
    pub fn returning(snapshot: VideoStatsSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            snapshot: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::empty()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsSource for MockStatsSource {
    async fn snapshot(&self) -> Result<Option<VideoStatsSnapshot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("MockStatsSource: network unreachable");
        }
        Ok(self.snapshot.clone())
    }
}
