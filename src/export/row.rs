//! Cell extraction for fields with options

use crate::classify::{stringify, Shape};
use crate::path;
use crate::types::Header;
use serde_json::Value;

/// Escape the separator inside a grouped value so cells stay unambiguous
pub fn escape_grouped(value: &str, separator: &str) -> String {
    if value.is_empty() || separator.is_empty() {
        return value.to_string();
    }
    let escaped = if separator == "\n" {
        String::from("\\n")
    } else {
        format!("\\{}", separator)
    };
    value.replace(separator, &escaped)
}

fn join_escaped<I, S>(values: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| escape_grouped(v.as_ref(), separator))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Plain lookup, with missing and null values as empty cells
pub fn lookup_cell(item: &Value, header: &str, cut_separator: &str) -> String {
    path::lookup(item, header, cut_separator)
        .map(stringify)
        .unwrap_or_default()
}

/// `grouped` without `named`: the whole field in one cell, or one property
/// of every element of an array of objects
pub fn grouped_cell(value: Option<&Value>, child: &[&str], separator: &str) -> String {
    let Some(property) = child.first() else {
        return match value {
            None | Some(Value::Null) => String::new(),
            Some(value) => match Shape::of(value) {
                Shape::Scalar => stringify(value),
                Shape::Sequence => join_escaped(
                    value.as_array().into_iter().flatten().map(stringify),
                    separator,
                ),
                Shape::Mapping => value
                    .as_object()
                    .into_iter()
                    .flatten()
                    .map(|(key, v)| {
                        format!(
                            "{}: {}",
                            escape_grouped(key, separator),
                            escape_grouped(&stringify(v), separator)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(separator),
            },
        };
    };

    // Missing properties keep their line so grouped columns line up
    let elements = value.and_then(Value::as_array).into_iter().flatten();
    join_escaped(
        elements.map(|element| element.get(*property).map(stringify).unwrap_or_default()),
        separator,
    )
}

/// `grouped` and `named`: one entry per element of the array, keyed by the
/// element's name property
pub fn grouped_named_cell(value: Option<&Value>, name: &str, header: Option<&Header>, separator: &str) -> String {
    let other_properties = header
        .and_then(Header::properties)
        .map_or(0, |p| p.keys().filter(|key| key.as_str() != name).count());

    let entries = value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|element| {
            let element_name = element.get(name).map(stringify).unwrap_or_default();
            let rest = element.iter().filter(|(key, _)| key.as_str() != name);
            if other_properties > 1 {
                let lines = rest
                    .map(|(key, v)| format!("{}: {}", key, stringify(v)))
                    .collect::<Vec<_>>()
                    .join(separator);
                format!("- {}{}{}", element_name, separator, lines)
            } else {
                let values = rest.map(|(_, v)| stringify(v)).collect::<Vec<_>>().join(",");
                format!("{}: {}", element_name, values)
            }
        });
    join_escaped(entries, separator)
}

/// `named` without `grouped`: `child` is `[name value, property]`
pub fn named_cell(value: Option<&Value>, name: &str, child: &[&str]) -> String {
    let [pivot, property, ..] = child else {
        return String::new();
    };
    let matches = |element: &Value| {
        element
            .get(name)
            .is_some_and(|n| !n.is_null() && stringify(n) == *pivot)
    };
    let found = match value {
        Some(Value::Array(elements)) => elements.iter().find(|&element| matches(element)),
        Some(object @ Value::Object(_)) if matches(object) => Some(object),
        _ => None,
    };
    found
        .and_then(|element| element.get(*property))
        .map(stringify)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_grouped() {
        assert_eq!(escape_grouped("", "\n"), "");
        assert_eq!(escape_grouped("a\nb", "\n"), "a\\nb");
        assert_eq!(escape_grouped("a;b", ";"), "a\\;b");
        assert_eq!(escape_grouped("plain", ","), "plain");
    }

    #[test]
    fn test_grouped_cell() {
        assert_eq!(grouped_cell(None, &[], "\n"), "");
        assert_eq!(grouped_cell(Some(&json!(null)), &[], "\n"), "");
        assert_eq!(grouped_cell(Some(&json!("a\nb")), &[], "\n"), "a\nb");
        assert_eq!(grouped_cell(Some(&json!([1, "x;y"])), &[], ";"), "1;x\\;y");
        assert_eq!(
            grouped_cell(Some(&json!({"name": "color", "value": "green"})), &[], "\n"),
            "name: color\nvalue: green"
        );

        let elements = json!([{"name": "color", "value": "green"}, {"name": "size"}, {"name": "material", "value": "cloth"}]);
        assert_eq!(grouped_cell(Some(&elements), &["value"], "\n"), "green\n\ncloth");
        assert_eq!(grouped_cell(Some(&elements), &["name"], "\n"), "color\nsize\nmaterial");
        assert_eq!(grouped_cell(None, &["name"], "\n"), "");
    }

    #[test]
    fn test_grouped_named_cell() {
        let elements = json!([{"name": "color", "value": "green"}, {"name": "size", "value": "XL"}]);
        assert_eq!(
            grouped_named_cell(Some(&elements), "name", None, "\n"),
            "color: green\nsize: XL"
        );

        let header = Header::Array {
            count: 2,
            properties: ["name", "value", "available"]
                .iter()
                .map(|k| (k.to_string(), Default::default()))
                .collect(),
        };
        let elements = json!([
            {"name": "color", "value": "green"},
            {"name": "size", "value": "XL", "available": true}
        ]);
        assert_eq!(
            grouped_named_cell(Some(&elements), "name", Some(&header), "\n"),
            "- color\\nvalue: green\n- size\\nvalue: XL\\navailable: true"
        );
    }

    #[test]
    fn test_named_cell() {
        let elements = json!([{"name": "color", "value": "green"}, {"name": 42, "value": "answer"}]);
        assert_eq!(named_cell(Some(&elements), "name", &["color", "value"]), "green");
        assert_eq!(named_cell(Some(&elements), "name", &["42", "value"]), "answer");
        assert_eq!(named_cell(Some(&elements), "name", &["size", "value"]), "");
        assert_eq!(named_cell(Some(&elements), "name", &["color"]), "");

        let object = json!({"name": "color", "value": "green"});
        assert_eq!(named_cell(Some(&object), "name", &["color", "value"]), "green");
        assert_eq!(named_cell(Some(&object), "name", &["size", "value"]), "");
        assert_eq!(named_cell(Some(&json!("text")), "name", &["color", "value"]), "");
        assert_eq!(named_cell(None, "name", &["color", "value"]), "");
    }
}
