use serde::Deserialize;

// --- commentThreads.list ---

/// One page of `commentThreads.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentThreadPage {
    #[serde(default)]
    pub items: Vec<CommentThread>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThread {
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThreadSnippet {
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentSnippet {
    #[serde(rename = "textDisplay")]
    pub text_display: String,
}

impl CommentThread {
    /// Plain text of the thread's top-level comment.
    pub fn into_text(self) -> String {
        self.snippet.top_level_comment.snippet.text_display
    }
}

// --- videos.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoItem {
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: RawStatistics,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoSnippet {
    pub title: String,
}

/// The API encodes counters as decimal strings and omits hidden ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStatistics {
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    #[serde(rename = "likeCount")]
    pub like_count: Option<String>,
    #[serde(rename = "commentCount")]
    pub comment_count: Option<String>,
}

/// Current counters and title of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStatistics {
    pub title: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

impl VideoItem {
    pub fn into_statistics(self) -> VideoStatistics {
        fn count(raw: Option<String>) -> u64 {
            raw.and_then(|s| s.parse().ok()).unwrap_or(0)
        }
        VideoStatistics {
            title: self.snippet.title,
            view_count: count(self.statistics.view_count),
            like_count: count(self.statistics.like_count),
            comment_count: count(self.statistics.comment_count),
        }
    }
}
