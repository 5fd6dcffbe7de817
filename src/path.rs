//! Field paths
//!
//! A field path addresses a value inside a record: object keys are joined
//! with the cut separator (`->` by default) and array positions are written
//! as `name[i]`, chained for nested arrays (`name[i][j]`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// Key followed by any number of trailing `[i]` groups
static COMPONENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?s)(.*?)((?:\[\d+\])*)$").unwrap());

static INDEX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").unwrap());

static INDEX_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\d+\]").unwrap());

/// Path of a property below `prefix`; the root prefix is empty
pub fn join(prefix: &str, name: &str, separator: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, separator, name)
    }
}

/// Path of the `i`-th element of the array at `prefix`
pub fn index(prefix: &str, i: usize) -> String {
    format!("{}[{}]", prefix, i)
}

/// Whether `path` lies strictly below `prefix` (an element or a property of it)
pub fn is_descendant(path: &str, prefix: &str, separator: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.starts_with(separator) || INDEX_PREFIX_REGEX.is_match(rest),
        None => false,
    }
}

/// Split a path into its key component and trailing array indices
fn parse_component(component: &str) -> (&str, Vec<usize>) {
    let Some(caps) = COMPONENT_REGEX.captures(component) else {
        return (component, Vec::new());
    };
    let key = caps.get(1).map_or("", |m| m.as_str());
    let indices = caps
        .get(2)
        .map(|m| {
            INDEX_REGEX
                .captures_iter(m.as_str())
                .filter_map(|c| c[1].parse::<usize>().ok())
                .collect()
        })
        .unwrap_or_default();
    (key, indices)
}

/// Resolve `path` inside `value`.
///
/// Returns `None` when any step is missing or indexes into the wrong kind of
/// value; lookups never fail loudly.
pub fn lookup<'a>(value: &'a Value, path: &str, separator: &str) -> Option<&'a Value> {
    let mut current = value;
    for component in path.split(separator) {
        // Every component starts with a key, possibly the empty one
        let (key, indices) = parse_component(component);
        current = current.as_object()?.get(key)?;
        for i in indices {
            current = current.as_array()?.get(i)?;
        }
    }
    Some(current)
}
