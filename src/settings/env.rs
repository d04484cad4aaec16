use serde_json::{Number, Value};

use super::SettingsTree;

/// Builds a tree from `(name, value)` pairs that start with `prefix` followed
/// by `separator`.
///
/// The rest of the name is split on `separator` and lowercased to form the
/// path, so with prefix `APP` and separator `__`, `APP__DB__PORT=5432` becomes
/// `{"db": {"port": 5432}}`. Values are coerced to boolean, integer or float
/// where they look like one, and kept as strings otherwise.
pub fn tree_from_vars<I, K, V>(vars: I, prefix: &str, separator: &str) -> SettingsTree
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let prefix_with_sep = format!("{prefix}{separator}");
    let mut tree = SettingsTree::new();

    for (key, value) in vars {
        let Some(path_str) = key.as_ref().strip_prefix(&prefix_with_sep) else {
            continue;
        };
        if path_str.is_empty() {
            continue;
        }

        let path: Vec<String> = path_str.split(separator).map(str::to_lowercase).collect();
        insert_at_path(&mut tree, &path, coerce_value(value.as_ref()));
    }

    tree
}

fn insert_at_path(tree: &mut SettingsTree, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        tree.insert(first.clone(), value);
        return;
    }

    let nested = tree
        .entry(first.clone())
        .or_insert_with(|| Value::Object(SettingsTree::new()));
    if !nested.is_object() {
        *nested = Value::Object(SettingsTree::new());
    }
    if let Value::Object(nested) = nested {
        insert_at_path(nested, rest, value);
    }
}

fn coerce_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::from(i);
        }
    }

    if s.contains('.') {
        if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }

    Value::String(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_paths_and_coercion() {
        let vars = [
            ("APP__DATABASE__HOST", "localhost"),
            ("APP__DATABASE__PORT", "5432"),
            ("APP__DEBUG", "TRUE"),
            ("APP__RATIO", "0.25"),
            ("APP__OFFSET", "-3"),
            ("APP__VERSION", "1.2.3"),
            ("OTHER__IGNORED", "x"),
            ("APP__", "empty"),
        ];
        let tree = tree_from_vars(vars, "APP", "__");

        assert_eq!(
            Value::Object(tree),
            json!({
                "database": { "host": "localhost", "port": 5432 },
                "debug": true,
                "ratio": 0.25,
                "offset": -3,
                "version": "1.2.3"
            })
        );
    }

    #[test]
    fn test_scalar_replaced_by_nested_path() {
        let vars = [("APP_LOG", "info"), ("APP_LOG_LEVEL", "debug")];
        let tree = tree_from_vars(vars, "APP", "_");
        assert_eq!(tree["log"], json!({ "level": "debug" }));
    }

    #[test]
    fn test_integer_overflow_stays_string() {
        let tree = tree_from_vars([("APP__BIG", "99999999999999999999")], "APP", "__");
        assert_eq!(tree["big"], json!("99999999999999999999"));
    }
}
