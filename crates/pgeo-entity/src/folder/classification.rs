//! Channel / container classification of folders.
//!
//! Classification is always derived from the folder's current children
//! and layers. The stored `is_channel` flag is only a hint for folders
//! that have neither.

use serde::{Deserialize, Serialize};

use super::model::Folder;

/// How a folder is presented to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Pure grouping node.
    Container,
    /// Leaf-bearing display unit.
    Channel,
}

impl Classification {
    /// Whether this is [`Classification::Channel`].
    pub fn is_channel(self) -> bool {
        matches!(self, Self::Channel)
    }
}

/// Derive the classification of `folder`.
///
/// Sub-folders always make a container; otherwise layers make a channel;
/// otherwise the stored hint decides, defaulting to container.
pub fn classify(folder: &Folder, has_child_folders: bool, has_layers: bool) -> Classification {
    if has_child_folders {
        Classification::Container
    } else if has_layers || folder.is_channel == Some(true) {
        Classification::Channel
    } else {
        Classification::Container
    }
}
