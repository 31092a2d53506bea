pub mod error;
pub mod types;

pub use error::{Result, YouTubeError};
pub use types::{CommentThread, CommentThreadPage, VideoListResponse, VideoStatistics};

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page size `commentThreads.list` accepts.
const COMMENT_PAGE_SIZE: &str = "100";

static RE_VIDEO_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap());
static RE_SHORT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").unwrap());

/// Pull the 11-character video id out of a watch URL, short link or embed URL.
/// Input that matches neither pattern is assumed to already be an id.
pub fn extract_video_id(url: &str) -> String {
    [&*RE_VIDEO_PARAM, &*RE_SHORT_LINK]
        .iter()
        .find_map(|re| re.captures(url).map(|c| c[1].to_string()))
        .unwrap_or_else(|| url.to_string())
}

pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (tests, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        if self.api_key.is_empty() {
            return Err(YouTubeError::MissingApiKey);
        }

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let resp = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch one page of top-level comment threads as plain text.
    pub async fn comment_thread_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentThreadPage> {
        let mut query = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("maxResults", COMMENT_PAGE_SIZE),
            ("textFormat", "plainText"),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        self.get("commentThreads", &query).await
    }

    /// Collect top-level comment texts in API order, following `nextPageToken`
    /// until the listing is exhausted or `max_results` comments are gathered.
    pub async fn comment_threads(
        &self,
        video_id: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<String>> {
        let mut comments = Vec::new();
        let mut next_page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self
                .comment_thread_page(video_id, next_page_token.as_deref())
                .await?;
            pages += 1;

            comments.extend(page.items.into_iter().map(CommentThread::into_text));
            next_page_token = page.next_page_token.filter(|t| !t.is_empty());

            if let Some(max) = max_results {
                if comments.len() >= max {
                    comments.truncate(max);
                    break;
                }
            }

            if next_page_token.is_none() {
                break;
            }

            tracing::debug!(video_id, pages, fetched = comments.len(), "Fetching next comment page");
        }

        tracing::info!(video_id, pages, count = comments.len(), "Fetched comment threads");
        Ok(comments)
    }

    /// Current statistics and title. `Ok(None)` when the video does not exist
    /// or is not visible to this key.
    pub async fn video_stats(&self, video_id: &str) -> Result<Option<VideoStatistics>> {
        let resp: VideoListResponse = self
            .get("videos", &[("part", "statistics,snippet"), ("id", video_id)])
            .await?;

        Ok(resp.items.into_iter().next().map(|item| item.into_statistics()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn thread(text: &str) -> serde_json::Value {
        serde_json::json!({
            "snippet": { "topLevelComment": { "snippet": { "textDisplay": text } } }
        })
    }

    #[test]
    fn extracts_id_from_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn extracts_id_from_short_link() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn extracts_id_from_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn bare_id_passes_through() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let server = MockServer::start().await;
        let client = YouTubeClient::new(String::new()).with_base_url(server.uri());

        let err = client.video_stats("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, YouTubeError::MissingApiKey));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_threads_follow_page_tokens_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [thread("third")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .and(query_param("videoId", "dQw4w9WgXcQ"))
            .and(query_param("textFormat", "plainText"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [thread("first"), thread("second")],
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        let client = YouTubeClient::new("yt-key".to_string()).with_base_url(server.uri());
        let comments = client.comment_threads("dQw4w9WgXcQ", None).await.unwrap();

        assert_eq!(comments, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn comment_threads_stop_at_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [thread("a"), thread("b"), thread("c")],
                "nextPageToken": "more"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = YouTubeClient::new("yt-key".to_string()).with_base_url(server.uri());
        let comments = client.comment_threads("dQw4w9WgXcQ", Some(2)).await.unwrap();

        assert_eq!(comments, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn video_stats_parses_counts_and_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", "dQw4w9WgXcQ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "snippet": { "title": "Pension reform explained" },
                    "statistics": { "viewCount": "1500", "likeCount": "40", "commentCount": "12" }
                }]
            })))
            .mount(&server)
            .await;

        let client = YouTubeClient::new("yt-key".to_string()).with_base_url(server.uri());
        let stats = client.video_stats("dQw4w9WgXcQ").await.unwrap().unwrap();

        assert_eq!(
            stats,
            VideoStatistics {
                title: "Pension reform explained".to_string(),
                view_count: 1500,
                like_count: 40,
                comment_count: 12,
            }
        );
    }

    #[tokio::test]
    async fn video_stats_none_when_no_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": [] })))
            .mount(&server)
            .await;

        let client = YouTubeClient::new("yt-key".to_string()).with_base_url(server.uri());
        assert!(client.video_stats("dQw4w9WgXcQ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn api_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let client = YouTubeClient::new("yt-key".to_string()).with_base_url(server.uri());
        let err = client.video_stats("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, YouTubeError::Api { status: 403, .. }));
    }
}
