//! Cached contributor avatars.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A downloaded avatar image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    /// File name of the image inside the avatar storage directory.
    pub image: String,
    /// When the image was fetched, in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Whether the image is a generated identicon rather than a real avatar.
    pub identicon: bool,
}

/// Avatars keyed by email address.
pub type AvatarCache = BTreeMap<String, Avatar>;
