//! Per-repository view preferences.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::merge::decode_with_defaults;

/// How files changed by a commit are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileViewType {
    /// Follow the global setting.
    #[default]
    Default,
    /// Nested folder tree.
    Tree,
    /// Flat list of paths.
    List,
}

/// Whether tags are shown in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShowTags {
    /// Follow the global setting.
    #[default]
    Default,
    /// Always show tags.
    Show,
    /// Always hide tags.
    Hide,
}

/// Pattern used to turn issue references in commit messages into links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLinkingConfig {
    /// Regular expression matching an issue reference.
    pub issue: String,
    /// URL template the match is substituted into.
    pub url: String,
}

/// View preferences remembered for a single repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoState {
    /// Column widths of the graph table, `None` for automatic layout.
    pub column_widths: Option<Vec<i32>>,

    /// Divider position of the docked commit details view (fraction).
    pub cdv_divider: f64,

    /// Height of the docked commit details view in pixels.
    pub cdv_height: u32,

    /// File view mode override.
    pub file_view_type: FileViewType,

    /// Remotes whose branches are hidden.
    pub hide_remotes: Vec<String>,

    /// Issue linking override for this repository.
    pub issue_linking_config: Option<IssueLinkingConfig>,

    /// Whether remote branches are shown.
    pub show_remote_branches: bool,

    /// Tag display override.
    pub show_tags: ShowTags,
}

impl Default for RepoState {
    fn default() -> Self {
        Self {
            column_widths: None,
            cdv_divider: 0.5,
            cdv_height: 250,
            file_view_type: FileViewType::default(),
            hide_remotes: Vec::new(),
            issue_linking_config: None,
            show_remote_branches: true,
            show_tags: ShowTags::default(),
        }
    }
}

impl RepoState {
    /// Decodes a persisted record, filling every missing field with its default.
    ///
    /// Returns `None` if a present field has the wrong shape.
    #[must_use]
    pub fn from_persisted(record: Value) -> Option<Self> {
        decode_with_defaults(record)
    }
}

/// Known repositories keyed by their root path.
pub type GitRepoSet = BTreeMap<String, RepoState>;
