pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config, AppConfig, FileConfig, StorePaths};
pub use error::CommentWatchError;
pub use types::*;
