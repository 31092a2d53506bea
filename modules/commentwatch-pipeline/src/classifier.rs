//! Batched comment classification with per-chunk fallback.
//!
//! Comments are split into consecutive chunks of at most `batch_size` and sent
//! one chunk at a time, in order. Every chunk yields exactly as many records as
//! it has comments: either the model's labels, or one fallback record per
//! comment when anything about the exchange went wrong. There are no retries,
//! so a run makes at most one call per chunk.

use std::sync::Arc;

use ai_client::{strip_code_blocks, truncate_to_char_boundary, AiError};
use serde::Deserialize;
use tracing::{debug, info, warn};

use commentwatch_common::{AnalysisRecord, Category, FailureKind, Sentiment};

use crate::prompt::PromptTemplate;
use crate::traits::ClassificationService;

/// Bytes of a bad response kept in the warning log.
const RAW_PREVIEW_BYTES: usize = 200;

/// One element of the response's `data` list.
#[derive(Debug, Clone, Deserialize)]
struct ClassifiedComment {
    /// Echo of the comment. Optional, since the original text replaces it on merge.
    #[serde(default)]
    text: String,
    sentiment: Sentiment,
    #[serde(default)]
    category: Option<Category>,
    keyword: String,
}

impl From<ClassifiedComment> for AnalysisRecord {
    fn from(c: ClassifiedComment) -> Self {
        AnalysisRecord {
            text: c.text,
            sentiment: c.sentiment,
            category: c.category,
            keyword: c.keyword,
        }
    }
}

/// A chunk that fell back to error records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Zero-based chunk index within the run.
    pub index: usize,
    pub size: usize,
    pub kind: FailureKind,
}

/// Output of one [`BatchClassifier::classify`] call.
#[derive(Debug, Default)]
pub struct ClassificationRun {
    /// One record per input comment, in input order.
    pub records: Vec<AnalysisRecord>,
    /// Chunks actually sent to the service.
    pub batches: usize,
    pub failures: Vec<BatchFailure>,
}

impl ClassificationRun {
    pub fn fallback_records(&self) -> usize {
        self.records.iter().filter(|r| r.is_fallback()).count()
    }
}

pub struct BatchClassifier {
    service: Arc<dyn ClassificationService>,
    template: PromptTemplate,
    batch_size: usize,
}

impl BatchClassifier {
    /// `batch_size` below 1 is treated as 1.
    pub fn new(
        service: Arc<dyn ClassificationService>,
        template: PromptTemplate,
        batch_size: usize,
    ) -> Self {
        Self {
            service,
            template,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Label `comments`. The result always holds exactly `comments.len()`
    /// records; failures surface as fallback records, never as an error.
    pub async fn classify(&self, comments: &[String]) -> ClassificationRun {
        if comments.is_empty() {
            return ClassificationRun::default();
        }

        if !self.service.has_credential() {
            warn!(
                comments = comments.len(),
                "No classification credential configured, storing fallback records"
            );
            return ClassificationRun {
                records: fallback_chunk(comments, FailureKind::MissingCredential),
                batches: 0,
                failures: vec![BatchFailure {
                    index: 0,
                    size: comments.len(),
                    kind: FailureKind::MissingCredential,
                }],
            };
        }

        let mut run = ClassificationRun {
            records: Vec::with_capacity(comments.len()),
            ..Default::default()
        };

        for (index, chunk) in comments.chunks(self.batch_size).enumerate() {
            run.batches += 1;
            match self.classify_chunk(index, chunk).await {
                Ok(records) => run.records.extend(records),
                Err(kind) => {
                    run.failures.push(BatchFailure {
                        index,
                        size: chunk.len(),
                        kind,
                    });
                    run.records.extend(fallback_chunk(chunk, kind));
                }
            }
        }

        info!(
            comments = comments.len(),
            batches = run.batches,
            failed_batches = run.failures.len(),
            "Classification complete"
        );
        run
    }

    async fn classify_chunk(
        &self,
        index: usize,
        chunk: &[String],
    ) -> Result<Vec<AnalysisRecord>, FailureKind> {
        let prompt = self.template.render(chunk);
        debug!(batch = index, size = chunk.len(), "Classifying batch");

        let raw = match self.service.complete_json(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                let kind = failure_kind(&e);
                warn!(batch = index, size = chunk.len(), kind = %kind, error = %e, "Classification request failed");
                return Err(kind);
            }
        };

        decode_response(&raw, chunk.len()).inspect_err(|kind| {
            warn!(
                batch = index,
                size = chunk.len(),
                kind = %kind,
                raw = truncate_to_char_boundary(&raw, RAW_PREVIEW_BYTES),
                "Unusable classification response"
            );
        })
    }
}

fn fallback_chunk(chunk: &[String], kind: FailureKind) -> Vec<AnalysisRecord> {
    chunk
        .iter()
        .map(|text| AnalysisRecord::fallback(text.as_str(), kind))
        .collect()
}

fn failure_kind(err: &AiError) -> FailureKind {
    match err {
        AiError::Parse(_) => FailureKind::MalformedResponse,
        AiError::Config(_) | AiError::Network(_) | AiError::Api { .. } => {
            FailureKind::TransportFailure
        }
    }
}

/// Decode `{"data": [...]}` holding exactly `expected` records.
fn decode_response(raw: &str, expected: usize) -> Result<Vec<AnalysisRecord>, FailureKind> {
    let value: serde_json::Value =
        serde_json::from_str(strip_code_blocks(raw)).map_err(|_| FailureKind::MalformedResponse)?;

    let object = value.as_object().ok_or(FailureKind::MalformedResponse)?;
    let data = object.get("data").ok_or(FailureKind::MissingDataKey)?;

    let items: Vec<ClassifiedComment> =
        serde_json::from_value(data.clone()).map_err(|_| FailureKind::MalformedResponse)?;

    if items.len() != expected {
        return Err(FailureKind::LengthMismatch);
    }

    // Free-form labels are only tolerated in stored rows, not from the model.
    if items.iter().any(|item| item.sentiment.is_unknown()) {
        return Err(FailureKind::MalformedResponse);
    }

    Ok(items.into_iter().map(AnalysisRecord::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn comments(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("comment {i}")).collect()
    }

    fn classifier(service: Arc<MockClassifier>, batch_size: usize) -> BatchClassifier {
        BatchClassifier::new(service, bare_template(), batch_size)
    }

    // ---------------------------------------------------------------------
    // Degenerate inputs
    // ---------------------------------------------------------------------

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let service = Arc::new(MockClassifier::labeling(Sentiment::Neutral));
        let run = classifier(service.clone(), 15).classify(&[]).await;

        assert!(run.records.is_empty());
        assert_eq!(run.batches, 0);
        assert!(run.failures.is_empty());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_credential_short_circuits() {
        let service = Arc::new(MockClassifier::without_credential());
        let input = vec!["hello".to_string(), "world".to_string()];
        let run = classifier(service.clone(), 15).classify(&input).await;

        assert_eq!(service.call_count(), 0);
        assert_eq!(run.batches, 0);
        assert_eq!(run.records.len(), 2);
        for (record, text) in run.records.iter().zip(&input) {
            assert_eq!(&record.text, text);
            assert_eq!(record.sentiment, Sentiment::Error);
            assert_eq!(record.keyword, "error:missing_credential");
        }
    }

    // ---------------------------------------------------------------------
    // Chunking
    // ---------------------------------------------------------------------

    #[tokio::test]
    async fn sixteen_comments_make_two_calls() {
        let service = Arc::new(MockClassifier::labeling(Sentiment::Positive));
        let run = classifier(service.clone(), 15).classify(&comments(16)).await;

        assert_eq!(service.chunk_sizes(), vec![15, 1]);
        assert_eq!(run.batches, 2);
        assert_eq!(run.records.len(), 16);
        assert!(run.records.iter().all(|r| r.sentiment == Sentiment::Positive));
    }

    #[tokio::test]
    async fn exact_multiple_makes_no_trailing_call() {
        let service = Arc::new(MockClassifier::labeling(Sentiment::Neutral));
        classifier(service.clone(), 5).classify(&comments(10)).await;
        assert_eq!(service.chunk_sizes(), vec![5, 5]);
    }

    #[tokio::test]
    async fn chunks_are_sent_in_input_order() {
        let service = Arc::new(MockClassifier::labeling(Sentiment::Neutral));
        let input = comments(5);
        classifier(service.clone(), 2).classify(&input).await;

        let sent: Vec<Vec<String>> = service.chunks();
        assert_eq!(sent.concat(), input);
    }

    #[tokio::test]
    async fn zero_batch_size_is_clamped() {
        let service = Arc::new(MockClassifier::labeling(Sentiment::Neutral));
        let clf = classifier(service.clone(), 0);
        assert_eq!(clf.batch_size(), 1);
        clf.classify(&comments(3)).await;
        assert_eq!(service.chunk_sizes(), vec![1, 1, 1]);
    }

    // ---------------------------------------------------------------------
    // Failure policy
    // ---------------------------------------------------------------------

    #[tokio::test]
    async fn transport_failure_replaces_whole_chunk() {
        let service = Arc::new(
            MockClassifier::new().fail_with(AiError::Network("connection reset".into())),
        );
        let input = comments(15);
        let run = classifier(service.clone(), 15).classify(&input).await;

        assert_eq!(service.call_count(), 1);
        assert_eq!(run.records.len(), 15);
        assert!(run.records.iter().all(|r| r.sentiment == Sentiment::Error));
        assert!(run
            .records
            .iter()
            .all(|r| r.keyword == "error:transport_failure"));
        let texts: Vec<&str> = run.records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, input.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(
            run.failures,
            vec![BatchFailure {
                index: 0,
                size: 15,
                kind: FailureKind::TransportFailure
            }]
        );
    }

    #[tokio::test]
    async fn api_error_is_transport_failure() {
        let service = Arc::new(MockClassifier::new().fail_with(AiError::Api {
            status: 429,
            message: "rate limited".into(),
        }));
        let run = classifier(service, 15).classify(&comments(2)).await;
        assert_eq!(run.failures[0].kind, FailureKind::TransportFailure);
    }

    #[tokio::test]
    async fn failed_chunk_does_not_block_later_chunks() {
        let service = Arc::new(
            MockClassifier::labeling(Sentiment::Negative)
                .fail_with(AiError::Network("timeout".into())),
        );
        let run = classifier(service.clone(), 2).classify(&comments(5)).await;

        assert_eq!(service.chunk_sizes(), vec![2, 2, 1]);
        let sentiments: Vec<Sentiment> = run.records.iter().map(|r| r.sentiment.clone()).collect();
        assert_eq!(
            sentiments,
            vec![
                Sentiment::Error,
                Sentiment::Error,
                Sentiment::Negative,
                Sentiment::Negative,
                Sentiment::Negative,
            ]
        );
        assert_eq!(run.fallback_records(), 2);
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let service = Arc::new(MockClassifier::new().respond_with("I think these are positive"));
        let run = classifier(service, 15).classify(&comments(3)).await;

        assert_eq!(run.records.len(), 3);
        assert!(run
            .records
            .iter()
            .all(|r| r.keyword == "error:malformed_response"));
    }

    #[tokio::test]
    async fn missing_data_key_fails_whole_chunk() {
        let service = Arc::new(MockClassifier::new().respond_with(
            r#"{"results": [{"text": "a", "sentiment": "positive", "keyword": "x"}]}"#,
        ));
        let run = classifier(service, 15).classify(&comments(1)).await;

        assert_eq!(run.records[0].keyword, "error:missing_data_key");
        assert_eq!(run.failures[0].kind, FailureKind::MissingDataKey);
    }

    #[tokio::test]
    async fn unknown_sentiment_is_malformed() {
        let service = Arc::new(MockClassifier::new().respond_with(
            r#"{"data": [{"text": "a", "sentiment": "ecstatic", "keyword": "x"}]}"#,
        ));
        let run = classifier(service, 15).classify(&comments(1)).await;
        assert_eq!(run.failures[0].kind, FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn shorter_data_list_is_length_mismatch() {
        let service = Arc::new(MockClassifier::new().respond_with(
            r#"{"data": [{"text": "a", "sentiment": "positive", "keyword": "x"}]}"#,
        ));
        let run = classifier(service, 15).classify(&comments(3)).await;

        assert_eq!(run.records.len(), 3);
        assert!(run.records.iter().all(|r| r.keyword == "error:length_mismatch"));
        assert_eq!(run.failures[0].kind, FailureKind::LengthMismatch);
    }

    #[tokio::test]
    async fn longer_data_list_is_length_mismatch() {
        let service = Arc::new(MockClassifier::new().respond_with(
            r#"{"data": [
                {"text": "a", "sentiment": "positive", "keyword": "x"},
                {"text": "b", "sentiment": "negative", "keyword": "y"}
            ]}"#,
        ));
        let run = classifier(service, 15).classify(&comments(1)).await;

        assert_eq!(run.records.len(), 1);
        assert_eq!(run.records[0].text, "comment 0");
        assert_eq!(run.records[0].keyword, "error:length_mismatch");
    }

    // ---------------------------------------------------------------------
    // Decoding
    // ---------------------------------------------------------------------

    #[test]
    fn decodes_labels_and_optional_category() {
        let records = decode_response(
            r#"{"data": [
                {"text": "수익률 최고", "sentiment": "긍정", "category": "fund_management", "keyword": "수익률"},
                {"text": "광고입니다", "sentiment": "ad", "keyword": "광고"}
            ]}"#,
            2,
        )
        .unwrap();

        assert_eq!(records[0].sentiment, Sentiment::Positive);
        assert_eq!(records[0].category, Some(Category::FundManagement));
        assert_eq!(records[1].sentiment, Sentiment::Ad);
        assert_eq!(records[1].category, None);
    }

    #[test]
    fn item_without_echoed_text_still_labels_chunk() {
        let records = decode_response(
            r#"{"data": [{"sentiment": "positive", "keyword": "x"}]}"#,
            1,
        )
        .unwrap();

        assert_eq!(records[0].sentiment, Sentiment::Positive);
        assert_eq!(records[0].keyword, "x");
        assert_eq!(records[0].text, "");
    }

    #[tokio::test]
    async fn chunk_without_echoed_text_is_not_a_failure() {
        let service = Arc::new(MockClassifier::new().respond_with(
            r#"{"data": [{"sentiment": "negative", "category": "politics", "keyword": "이사장"}]}"#,
        ));
        let input = vec!["이사장 사퇴하라".to_string()];
        let run = classifier(service, 15).classify(&input).await;

        assert!(run.failures.is_empty());
        assert_eq!(run.records[0].sentiment, Sentiment::Negative);
        assert_eq!(run.records[0].category, Some(Category::Politics));
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n{\"data\": [{\"text\": \"a\", \"sentiment\": \"neutral\", \"keyword\": \"k\"}]}\n```";
        assert_eq!(decode_response(raw, 1).unwrap().len(), 1);
    }

    #[test]
    fn top_level_array_is_malformed() {
        let raw = r#"[{"text": "a", "sentiment": "neutral", "keyword": "k"}]"#;
        assert_eq!(decode_response(raw, 1), Err(FailureKind::MalformedResponse));
    }

    #[test]
    fn data_not_a_list_is_malformed() {
        assert_eq!(
            decode_response(r#"{"data": "none"}"#, 1),
            Err(FailureKind::MalformedResponse)
        );
    }

    #[test]
    fn empty_data_for_empty_chunk_is_fine() {
        assert_eq!(decode_response(r#"{"data": []}"#, 0), Ok(Vec::new()));
    }
}
