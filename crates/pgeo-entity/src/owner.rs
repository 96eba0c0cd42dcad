//! Owner of a folder tree: a single user or a group.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The owner of a folder or layer.
///
/// Records store the owner as two nullable columns (`user_id`,
/// `group_id`); a user owner takes precedence when both are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    /// A single user.
    User(Uuid),
    /// A group of users.
    Group(Uuid),
}

impl Owner {
    /// The owner's identifier.
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(id) | Self::Group(id) => *id,
        }
    }

    /// Whether this owner is a group.
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Build an owner from the record columns.
    pub fn from_columns(user_id: Option<Uuid>, group_id: Option<Uuid>) -> Option<Self> {
        match (user_id, group_id) {
            (Some(user), _) => Some(Self::User(user)),
            (None, Some(group)) => Some(Self::Group(group)),
            (None, None) => None,
        }
    }

    /// Split into `(user_id, group_id)` record columns.
    pub fn columns(&self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Self::User(id) => (Some(*id), None),
            Self::Group(id) => (None, Some(*id)),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}
