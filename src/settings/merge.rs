//! Deep merging of settings trees.

use serde_json::Value;

use super::SettingsTree;

/// Merges trees left to right; later trees take precedence.
///
/// Nested tables present on both sides are merged recursively. Anything else
/// (scalars, arrays, a table meeting a scalar) is replaced by the later value.
pub fn merge<I>(trees: I) -> SettingsTree
where
    I: IntoIterator<Item = SettingsTree>,
{
    let mut merged = SettingsTree::new();
    for tree in trees {
        deep_merge(&mut merged, tree);
    }
    merged
}

/// Folds `overlay` into `base` in place.
pub fn deep_merge(base: &mut SettingsTree, overlay: SettingsTree) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(base_table)), Value::Object(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
