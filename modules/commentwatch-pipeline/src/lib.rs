pub mod classifier;
pub mod dedup;
pub mod llm;
pub mod merge;
pub mod pipeline;
pub mod prompt;
pub mod sources;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use classifier::{BatchClassifier, BatchFailure, ClassificationRun};
pub use pipeline::{Pipeline, RunReport};
pub use prompt::PromptTemplate;
pub use stats::StatsRecorder;
pub use traits::{ClassificationService, CommentSource, StatsSource};
