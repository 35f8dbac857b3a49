//! Repograph Domain - Persisted state records
//!
//! This crate defines the records remembered between sessions by the
//! repository graph view, together with the pure rules that govern them
//! (default merging, code review bookkeeping). Nothing here performs I/O.

pub mod avatar;
pub mod code_review;
pub mod merge;
pub mod repo_state;
pub mod view_state;

pub use avatar::{Avatar, AvatarCache};
pub use code_review::{
    CODE_REVIEW_EXPIRY_MS, CodeReview, CodeReviewData, CodeReviews, RepoCodeReviews,
};
pub use merge::{decode_with_defaults, merge_defaults};
pub use repo_state::{FileViewType, GitRepoSet, IssueLinkingConfig, RepoState, ShowTags};
pub use view_state::GlobalViewState;
