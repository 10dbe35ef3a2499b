//! Deep merge for configuration trees.
//!
//! Implements node-by-node merging where later trees override earlier ones.
//! A key cannot hold both a scalar and a subtree, so when the two kinds meet
//! the later definition replaces the earlier one entirely.

use super::tree::{ConfigTree, ConfigValue};

/// Deep merge two trees, with `overlay` taking precedence over `base`.
///
/// - Subtrees present on both sides are merged recursively
/// - Scalars in overlay replace whatever base holds at that key
/// - A subtree in overlay replaces a scalar in base
///
/// # Example
/// ```
/// use taskw::config::{ConfigTree, deep_merge};
///
/// let base = ConfigTree::from_pairs([("color", "on"), ("data.location", "~/.task")]);
/// let overlay = ConfigTree::from_pairs([("color.header", "red")]);
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged.get_path("color.header"), Some("red"));
/// assert_eq!(merged.get_path("data.location"), Some("~/.task"));
/// ```
pub fn deep_merge(base: ConfigTree, overlay: ConfigTree) -> ConfigTree {
    let mut base_map = base.into_entries();
    for (key, overlay_value) in overlay.into_entries() {
        let merged_value = match (base_map.remove(&key), overlay_value) {
            // Both are trees: merge recursively
            (Some(ConfigValue::Tree(base_tree)), ConfigValue::Tree(overlay_tree)) => {
                ConfigValue::Tree(deep_merge(base_tree, overlay_tree))
            }
            // Any other case: overlay replaces base entirely
            (_, overlay_value) => overlay_value,
        };
        base_map.insert(key, merged_value);
    }
    ConfigTree::from_entries(base_map)
}

/// Merge multiple trees in order, with later trees taking precedence.
///
/// Equivalent to folding `deep_merge` over the list.
pub fn deep_merge_all(trees: impl IntoIterator<Item = ConfigTree>) -> ConfigTree {
    trees.into_iter().fold(ConfigTree::new(), deep_merge)
}
