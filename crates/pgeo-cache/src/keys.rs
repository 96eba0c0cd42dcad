//! Cache key builders for persistence-geo cache entries.

use pgeo_entity::owner::Owner;

/// Prefix applied to all persistence-geo cache keys.
const PREFIX: &str = "pgeo";

/// Cache key for the materialized root folder of an owner.
pub fn root_folder(owner: Owner) -> String {
    let kind = if owner.is_group() { "group" } else { "user" };
    format!("{PREFIX}:root:{kind}:{}", owner.id())
}

/// Pattern matching every cached root folder.
pub fn root_folder_pattern() -> String {
    format!("{PREFIX}:root:*")
}
