//! On-disk stores for labeled comments and video statistics.
//!
//! Both stores are CSV files with a header row. A run reads a store whole,
//! appends in memory, and rewrites it with [`csv_file::write_rows_atomic`], so a
//! reader never observes a half-written file.

pub mod comments;
pub mod csv_file;
pub mod error;
pub mod stats;

pub use comments::CommentStore;
pub use error::{Result, StoreError};
pub use stats::StatsStore;
