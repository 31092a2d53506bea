use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use tracing::{info, warn};

use commentwatch_common::VideoStatsSnapshot;
use youtube_client::{extract_video_id, YouTubeClient};

use crate::traits::{CommentSource, StatsSource};

/// The watched video, read through the YouTube Data API.
pub struct YouTubeVideo {
    client: Option<YouTubeClient>,
    video_id: String,
    max_comments: Option<usize>,
    offset: FixedOffset,
}

impl YouTubeVideo {
    /// `api_key` may be absent; comment collection then fails for the run and
    /// stats report nothing.
    pub fn new(
        api_key: Option<String>,
        video_url: &str,
        max_comments: Option<usize>,
        utc_offset_hours: i32,
    ) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
            .ok_or_else(|| anyhow!("Invalid UTC offset: {utc_offset_hours} hours"))?;
        let video_id = extract_video_id(video_url);
        info!(video_id = %video_id, "Watching video");
        Ok(Self {
            client: api_key.map(YouTubeClient::new),
            video_id,
            max_comments,
            offset,
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

#[async_trait]
impl CommentSource for YouTubeVideo {
    async fn comments(&self) -> Result<Vec<String>> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow!("YOUTUBE_API_KEY is not configured"))?;
        Ok(client
            .comment_threads(&self.video_id, self.max_comments)
            .await?)
    }
}

#[async_trait]
impl StatsSource for YouTubeVideo {
    async fn snapshot(&self) -> Result<Option<VideoStatsSnapshot>> {
        let Some(client) = self.client.as_ref() else {
            warn!("YOUTUBE_API_KEY is not configured, no stats snapshot this run");
            return Ok(None);
        };

        let Some(stats) = client.video_stats(&self.video_id).await? else {
            return Ok(None);
        };

        Ok(Some(VideoStatsSnapshot {
            timestamp: Utc::now().with_timezone(&self.offset).naive_local(),
            view_count: stats.view_count,
            like_count: stats.like_count,
            comment_count: stats.comment_count,
            title: stats.title,
        }))
    }
}
