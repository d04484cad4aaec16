use serde_json::Value;

use super::{SettingsError, SettingsTree};

/// Resolves a dot-delimited `path` against `tree`.
///
/// The last segment may name a value of any type; every segment before it
/// must name a nested table.
pub fn extract<'a>(tree: &'a SettingsTree, path: &str) -> Result<&'a Value, SettingsError> {
    let (first, rest) = match path.split_once('.') {
        Some((first, rest)) => (first, Some(rest)),
        None => (path, None),
    };

    let value = tree
        .get(first)
        .ok_or_else(|| SettingsError::NotFound(first.to_string()))?;

    match rest {
        None => Ok(value),
        Some(rest) => match value {
            Value::Object(nested) => extract(nested, rest),
            _ => Err(SettingsError::NotATree(first.to_string())),
        },
    }
}
