//! Code review progress tracking.
//!
//! A code review records which files of a commit (or commit range) diff the
//! user still has to look at. Reviews are grouped by repository and keyed by
//! an opaque review id, usually a commit hash or `"<from>-<to>"`.
//!
//! Two invariants hold after every mutation:
//! - a review with no remaining files is removed
//! - a repository with no reviews is removed

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reviews untouched for longer than this are expired (90 days).
pub const CODE_REVIEW_EXPIRY_MS: i64 = 7_776_000_000;

/// Persisted progress of a single review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeReviewData {
    /// Last time the review was opened or advanced, in ms since the Unix epoch.
    pub last_active: i64,
    /// The most recently reviewed file.
    pub last_viewed_file: Option<String>,
    /// Files not yet reviewed, in diff order.
    pub remaining_files: Vec<String>,
}

/// A review tagged with its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeReview {
    /// Opaque review id.
    pub id: String,
    /// Review progress.
    #[serde(flatten)]
    pub data: CodeReviewData,
}

/// All reviews of one repository keyed by review id.
pub type RepoCodeReviews = BTreeMap<String, CodeReviewData>;

/// Every tracked review, keyed by repository and then by review id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeReviews(BTreeMap<String, RepoCodeReviews>);

impl CodeReviews {
    /// Creates an empty set of reviews.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns true if no review is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the reviews of a repository.
    #[must_use]
    pub fn repo(&self, repo: &str) -> Option<&RepoCodeReviews> {
        self.0.get(repo)
    }

    /// Returns a single review.
    #[must_use]
    pub fn get(&self, repo: &str, id: &str) -> Option<CodeReview> {
        self.0.get(repo).and_then(|reviews| reviews.get(id)).map(|data| CodeReview {
            id: id.to_string(),
            data: data.clone(),
        })
    }

    /// Starts (or restarts) a review, replacing any previous progress.
    ///
    /// A review without files has nothing left to track, so it is ended
    /// instead of stored.
    pub fn start(
        &mut self,
        repo: &str,
        id: &str,
        files: Vec<String>,
        last_viewed_file: Option<String>,
        now: DateTime<Utc>,
    ) -> CodeReview {
        let data = CodeReviewData {
            last_active: now.timestamp_millis(),
            last_viewed_file,
            remaining_files: files,
        };
        if data.remaining_files.is_empty() {
            self.end(repo, id);
        } else {
            self.0
                .entry(repo.to_string())
                .or_default()
                .insert(id.to_string(), data.clone());
        }
        CodeReview {
            id: id.to_string(),
            data,
        }
    }

    /// Marks a review as active now and returns it.
    pub fn touch(&mut self, repo: &str, id: &str, now: DateTime<Utc>) -> Option<CodeReview> {
        let data = self.0.get_mut(repo)?.get_mut(id)?;
        data.last_active = now.timestamp_millis();
        Some(CodeReview {
            id: id.to_string(),
            data: data.clone(),
        })
    }

    /// Records that `file` has been reviewed.
    ///
    /// Removes the first occurrence of `file` from the remaining files. The
    /// review is ended once nothing remains. Returns false if the review does
    /// not exist.
    pub fn mark_file_reviewed(
        &mut self,
        repo: &str,
        id: &str,
        file: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(data) = self.0.get_mut(repo).and_then(|reviews| reviews.get_mut(id)) else {
            return false;
        };

        if let Some(index) = data.remaining_files.iter().position(|f| f == file) {
            data.remaining_files.remove(index);
        }

        if data.remaining_files.is_empty() {
            self.end(repo, id);
        } else {
            data.last_viewed_file = Some(file.to_string());
            data.last_active = now.timestamp_millis();
        }
        true
    }

    /// Ends a review. Returns true if it existed.
    pub fn end(&mut self, repo: &str, id: &str) -> bool {
        let Some(reviews) = self.0.get_mut(repo) else {
            return false;
        };
        let removed = reviews.remove(id).is_some();
        if reviews.is_empty() {
            self.0.remove(repo);
        }
        removed
    }

    /// Removes every review last active strictly before `now` minus
    /// [`CODE_REVIEW_EXPIRY_MS`]. Returns the number of reviews removed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now.timestamp_millis() - CODE_REVIEW_EXPIRY_MS;
        let mut expired = 0;

        for reviews in self.0.values_mut() {
            let before = reviews.len();
            reviews.retain(|_, data| data.last_active >= cutoff);
            expired += before - reviews.len();
        }
        self.0.retain(|_, reviews| !reviews.is_empty());

        expired
    }

    /// Moves every review of `from` to `to`, replacing any reviews `to` had.
    ///
    /// Returns true if anything moved.
    pub fn transfer(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        match self.0.remove(from) {
            Some(reviews) => {
                self.0.insert(to.to_string(), reviews);
                true
            }
            None => false,
        }
    }
}

impl From<BTreeMap<String, RepoCodeReviews>> for CodeReviews {
    fn from(reviews: BTreeMap<String, RepoCodeReviews>) -> Self {
        Self(reviews)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid timestamp")
    }

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn start_preserves_order_and_duplicates() {
        let mut reviews = CodeReviews::new();
        let review = reviews.start("/repo", "abc", files(&["b", "a", "b"]), None, at(1_000));

        assert_eq!(review.id, "abc");
        assert_eq!(review.data.remaining_files, files(&["b", "a", "b"]));
        assert_eq!(review.data.last_active, 1_000);
        assert_eq!(reviews.get("/repo", "abc"), Some(review));
    }

    #[test]
    fn start_without_files_is_not_tracked() {
        let mut reviews = CodeReviews::new();
        reviews.start("/repo", "abc", files(&["a"]), None, at(0));
        reviews.start("/repo", "def", files(&["a"]), None, at(0));

        let review = reviews.start("/repo", "abc", Vec::new(), None, at(1_000));
        assert_eq!(review.id, "abc");
        assert!(review.data.remaining_files.is_empty());
        assert!(reviews.get("/repo", "abc").is_none());
        assert!(reviews.get("/repo", "def").is_some());

        reviews.start("/other", "xyz", Vec::new(), None, at(1_000));
        assert!(reviews.repo("/other").is_none());
    }

    #[test]
    fn touch_refreshes_last_active() {
        let mut reviews = CodeReviews::new();
        reviews.start("/repo", "abc", files(&["a"]), None, at(1_000));

        let touched = reviews.touch("/repo", "abc", at(5_000)).unwrap();
        assert_eq!(touched.data.last_active, 5_000);
        assert!(reviews.touch("/repo", "missing", at(5_000)).is_none());
    }

    #[test]
    fn reviewing_files_advances_then_ends() {
        let mut reviews = CodeReviews::new();
        reviews.start("/repo", "a-b", files(&["f1", "f2"]), None, at(0));

        assert!(reviews.mark_file_reviewed("/repo", "a-b", "f1", at(10)));
        let review = reviews.get("/repo", "a-b").unwrap();
        assert_eq!(review.data.remaining_files, files(&["f2"]));
        assert_eq!(review.data.last_viewed_file.as_deref(), Some("f1"));
        assert_eq!(review.data.last_active, 10);

        assert!(reviews.mark_file_reviewed("/repo", "a-b", "f2", at(20)));
        assert!(reviews.get("/repo", "a-b").is_none());
        assert!(reviews.repo("/repo").is_none());
    }

    #[test]
    fn reviewing_unknown_file_still_refreshes() {
        let mut reviews = CodeReviews::new();
        reviews.start("/repo", "abc", files(&["f1"]), None, at(0));

        assert!(reviews.mark_file_reviewed("/repo", "abc", "other", at(7)));
        let review = reviews.get("/repo", "abc").unwrap();
        assert_eq!(review.data.remaining_files, files(&["f1"]));
        assert_eq!(review.data.last_viewed_file.as_deref(), Some("other"));
    }

    #[test]
    fn reviewing_missing_review_is_noop() {
        let mut reviews = CodeReviews::new();
        assert!(!reviews.mark_file_reviewed("/repo", "abc", "f1", at(0)));
        assert!(reviews.is_empty());
    }

    #[test]
    fn end_is_idempotent_and_prunes_repo() {
        let mut reviews = CodeReviews::new();
        reviews.start("/repo", "one", files(&["f"]), None, at(0));
        reviews.start("/repo", "two", files(&["f"]), None, at(0));

        assert!(reviews.end("/repo", "one"));
        assert!(!reviews.end("/repo", "one"));
        assert!(reviews.repo("/repo").is_some());

        assert!(reviews.end("/repo", "two"));
        assert!(reviews.is_empty());
        assert!(!reviews.end("/other", "x"));
    }

    #[test]
    fn expiry_keeps_boundary_entries() {
        let now = CODE_REVIEW_EXPIRY_MS + 1_000_000;
        let mut reviews = CodeReviews::new();
        reviews.start("/a", "stale", files(&["f"]), None, at(now - CODE_REVIEW_EXPIRY_MS - 1));
        reviews.start("/a", "boundary", files(&["f"]), None, at(now - CODE_REVIEW_EXPIRY_MS));
        reviews.start("/b", "stale", files(&["f"]), None, at(0));

        assert_eq!(reviews.expire(at(now)), 2);
        assert!(reviews.get("/a", "boundary").is_some());
        assert!(reviews.get("/a", "stale").is_none());
        assert!(reviews.repo("/b").is_none());
        assert_eq!(reviews.expire(at(now)), 0);
    }

    #[test]
    fn transfer_renames_repo_key() {
        let mut reviews = CodeReviews::new();
        reviews.start("/old", "abc", files(&["f"]), None, at(0));

        assert!(reviews.transfer("/old", "/new"));
        assert!(reviews.repo("/old").is_none());
        assert!(reviews.get("/new", "abc").is_some());
        assert!(!reviews.transfer("/old", "/new"));
        assert!(!reviews.transfer("/new", "/new"));
        assert!(reviews.get("/new", "abc").is_some());
    }

    #[test]
    fn persisted_shape_is_nested_map() {
        let mut reviews = CodeReviews::new();
        reviews.start("/repo", "abc", files(&["f"]), Some("g".into()), at(42));

        let value = serde_json::to_value(&reviews).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "/repo": {
                    "abc": { "lastActive": 42, "lastViewedFile": "g", "remainingFiles": ["f"] }
                }
            })
        );
    }
}
