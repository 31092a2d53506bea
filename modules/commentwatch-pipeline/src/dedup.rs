//! Selects the comments a run has not seen before.

use std::collections::HashSet;

use commentwatch_common::normalized_key;
use commentwatch_store::CommentStore;

/// Subsequence of `fetched` whose normalized key is neither in `store` nor
/// already emitted earlier in the result. Input order is kept; the first
/// occurrence of each key wins, with its original spacing.
pub fn new_comments(fetched: &[String], store: &CommentStore) -> Vec<String> {
    let mut seen = HashSet::new();
    fetched
        .iter()
        .filter(|comment| {
            let key = normalized_key(comment);
            !store.contains_key(&key) && seen.insert(key)
        })
        .cloned()
        .collect()
}
