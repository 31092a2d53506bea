use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// --- Comment identity ---

/// Canonical dedup identity of a comment: the text with every whitespace
/// character removed, including internal runs and newlines. Only ever used to
/// compare comments, never for display.
pub fn normalized_key(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

// --- Labels ---

/// Sentiment toward the monitored organization.
///
/// `Error` is not a model judgment: it marks a record produced by the
/// fallback path when classification failed. The Korean labels are the ones
/// earlier prompt revisions asked the model for and are read as their English
/// counterparts.
///
/// `Unknown` keeps any other label found in a stored row verbatim, so old files
/// with free-form labels still load and are written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Ad,
    Error,
    Unknown(String),
}

impl Sentiment {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "positive" | "긍정" => Sentiment::Positive,
            "negative" | "부정" => Sentiment::Negative,
            "neutral" | "중립" => Sentiment::Neutral,
            "ad" | "광고" => Sentiment::Ad,
            "error" | "오류" => Sentiment::Error,
            _ => Sentiment::Unknown(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Ad => "ad",
            Sentiment::Error => "error",
            Sentiment::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Sentiment::Unknown(_))
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Sentiment::from_label(&raw))
    }
}

/// Topic of a comment. Any label outside the known set collapses to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Policy,
    FundManagement,
    Leadership,
    Service,
    Politics,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Policy => write!(f, "policy"),
            Category::FundManagement => write!(f, "fund_management"),
            Category::Leadership => write!(f, "leadership"),
            Category::Service => write!(f, "service"),
            Category::Politics => write!(f, "politics"),
            Category::Other => write!(f, "other"),
        }
    }
}

// --- Classification failures ---

/// Prefix marking a keyword as a failure tag rather than a topic.
pub const ERROR_KEYWORD_PREFIX: &str = "error:";

/// Why a chunk of comments fell back to error records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No classification credential configured; nothing was sent.
    MissingCredential,
    /// Network error, non-2xx status, or an unusable HTTP exchange.
    TransportFailure,
    /// Body was not JSON, or `data` did not match the record shape.
    MalformedResponse,
    /// Body was a JSON object without the `data` key.
    MissingDataKey,
    /// `data` held a different number of records than the chunk had comments.
    LengthMismatch,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MissingCredential => "missing_credential",
            FailureKind::TransportFailure => "transport_failure",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::MissingDataKey => "missing_data_key",
            FailureKind::LengthMismatch => "length_mismatch",
        }
    }

    /// Keyword written on fallback records, e.g. `error:transport_failure`.
    pub fn keyword(&self) -> String {
        format!("{ERROR_KEYWORD_PREFIX}{}", self.as_str())
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Records ---

/// One labeled comment. Field order is the on-disk column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(default)]
    pub text: String,
    pub sentiment: Sentiment,
    /// Absent on rows written before categories existed.
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub keyword: String,
}

impl AnalysisRecord {
    /// Substitute record for a comment whose chunk failed classification.
    pub fn fallback(text: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            text: text.into(),
            sentiment: Sentiment::Error,
            category: None,
            keyword: kind.keyword(),
        }
    }

    /// True for records produced by the fallback path.
    pub fn is_fallback(&self) -> bool {
        self.sentiment == Sentiment::Error && self.keyword.starts_with(ERROR_KEYWORD_PREFIX)
    }

    pub fn key(&self) -> String {
        normalized_key(&self.text)
    }
}

// --- Video statistics ---

pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Counters for the watched video at one collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStatsSnapshot {
    #[serde(with = "snapshot_timestamp")]
    pub timestamp: NaiveDateTime,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub title: String,
}

mod snapshot_timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::SNAPSHOT_TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(SNAPSHOT_TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(raw.trim(), SNAPSHOT_TIMESTAMP_FORMAT)
            .map_err(de::Error::custom)
    }
}
