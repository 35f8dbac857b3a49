//! View preferences shared by every workspace.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::merge::decode_with_defaults;
use crate::repo_state::IssueLinkingConfig;

/// Global view state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalViewState {
    /// Skip the confirmation dialog when checking out a commit.
    pub always_accept_checkout_commit: bool,

    /// Issue linking pattern used when a repository has no override.
    pub issue_linking_config: Option<IssueLinkingConfig>,
}

impl GlobalViewState {
    /// Decodes a persisted record, filling every missing field with its default.
    #[must_use]
    pub fn from_persisted(record: Value) -> Option<Self> {
        decode_with_defaults(record)
    }
}
