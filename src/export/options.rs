//! Validation of exporter settings
//!
//! Field options, header filters and header order entries that can't be
//! applied are dropped with a warning so the export goes on with the rest.
//! Only malformed renaming rules are rejected.

use crate::diagnostics::{Diagnostic, DiagnosticSink, Severity};
use crate::error::{FlattenError, Result};
use crate::types::{FieldOption, Header, Stats};
use indexmap::IndexMap;
use regex::Regex;

/// Characters allowed in per-header grouped separators
pub const ALLOWED_SEPARATORS: [char; 5] = [';', ',', '\n', '>', ' '];

fn warn(sink: &dyn DiagnosticSink, path: &str, message: String) {
    sink.emit(Diagnostic::new(Severity::Warning, message).at(path));
}

/// Keep only the field options that can be applied to the collected stats
pub fn validate_field_options(
    field_options: &IndexMap<String, FieldOption>,
    stats: &Stats,
    sink: &dyn DiagnosticSink,
) -> IndexMap<String, FieldOption> {
    let mut validated = IndexMap::new();
    for (field, option) in field_options {
        if let Some(message) = rejection(field, option, stats) {
            warn(sink, field, message);
            continue;
        }
        validated.insert(field.clone(), option.clone());
    }
    validated
}

/// Why the option can't be applied, `None` if it can
fn rejection(field: &str, option: &FieldOption, stats: &Stats) -> Option<String> {
    let skipped = format!("Field option \"{}\" will be skipped.", field);

    let Some(header) = stats.get(field) else {
        return Some(format!(
            "Field option for field \"{}\" will be skipped. Either this field doesn't exist, \
             or input items have invalid data, so can't be grouped or named.",
            field
        ));
    };
    if !option.named && !option.grouped {
        return Some(format!(
            "Field options must be either `named` or `grouped` or both. {}",
            skipped
        ));
    }
    let name = option.name_property();
    if option.named && name.is_none() {
        return Some(format!(
            "Named adjusted properties ({}) must include `name` parameter. {}",
            field, skipped
        ));
    }
    for (key, separator) in &option.grouped_separators {
        if !separator.chars().all(|c| ALLOWED_SEPARATORS.contains(&c)) {
            return Some(format!(
                "Only {:?} could be used as custom grouped separators ({}:{:?}). {}",
                ALLOWED_SEPARATORS, key, separator, skipped
            ));
        }
    }
    if *header == Header::Scalar {
        return Some(format!(
            "Field \"{}\" only holds single values, so it can't be grouped or named. {}",
            field, skipped
        ));
    }

    let Some(name) = name.filter(|_| option.named) else {
        return None;
    };
    let Some(properties) = header.properties().filter(|p| !p.is_empty()) else {
        return Some(format!(
            "Field \"{}\" doesn't have any properties (not array of objects), \
             so \"named\" option can't be applied. {}",
            field, skipped
        ));
    };
    let Some(name_property) = properties.get(name) else {
        return Some(format!(
            "Field \"{}\" doesn't have name property \"{}\", so \"named\" option can't be applied. {}",
            field, name, skipped
        ));
    };
    if !option.grouped {
        if name_property.limited {
            return Some(format!(
                "Field \"{}\" values for name property \"{}\" were limited by \"named_columns_limit\" \
                 when collecting stats, so \"named\" option can't be applied. {}",
                field, name, skipped
            ));
        }
    } else if header.count().unwrap_or(0) == 0 {
        // Every key of an object appears once, so there is nothing to group by name
        return Some(format!(
            "Only arrays of objects could be grouped and named at the same time. \
             Field \"{}\" isn't an array, so field option \"{}\" will be skipped.",
            field, field
        ));
    }
    None
}

/// Compile header filters; a header matching any of them from its start is dropped
pub fn compile_filters(filters: &[String], sink: &dyn DiagnosticSink) -> Vec<Regex> {
    filters
        .iter()
        .filter_map(|filter| match Regex::new(&format!("^(?:{})", filter)) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn(
                    sink,
                    filter,
                    format!("Header filter \"{}\" isn't a valid regex and will be skipped: {}", filter, err),
                );
                None
            }
        })
        .collect()
}

pub fn validate_headers_order(order: &[String], sink: &dyn DiagnosticSink) -> Vec<String> {
    order
        .iter()
        .filter(|header| {
            if header.is_empty() {
                warn(sink, "", "Empty headers can't be ordered and will be skipped.".to_string());
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

/// Compile `(pattern, replacement)` renaming rules, in order
pub fn compile_renaming(rules: &[(String, String)]) -> Result<Vec<(Regex, String)>> {
    rules
        .iter()
        .map(|(pattern, replacement)| {
            Regex::new(pattern)
                .map(|regex| (regex, replacement.clone()))
                .map_err(|source| FlattenError::InvalidRenaming {
                    pattern: pattern.clone(),
                    source,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::types::{Properties, Property};

    fn stats() -> Stats {
        let mut properties = Properties::new();
        properties.insert(
            "name".to_string(),
            Property {
                values: ["color".to_string(), "size".to_string()].into_iter().collect(),
                limited: false,
            },
        );
        properties.insert("value".to_string(), Property::default());

        let mut limited = properties.clone();
        limited.insert(
            "name".to_string(),
            Property {
                values: Default::default(),
                limited: true,
            },
        );

        let mut stats = Stats::new();
        stats.insert(
            "array".to_string(),
            Header::Array {
                count: 2,
                properties: properties.clone(),
            },
        );
        stats.insert("object".to_string(), Header::Object { properties });
        stats.insert(
            "limited".to_string(),
            Header::Array {
                count: 3,
                properties: limited,
            },
        );
        stats.insert(
            "plain".to_string(),
            Header::Array {
                count: 2,
                properties: Properties::new(),
            },
        );
        stats.insert("scalar".to_string(), Header::Scalar);
        stats
    }

    fn validate(options: Vec<(&str, FieldOption)>) -> (Vec<String>, std::sync::Arc<MemorySink>) {
        let sink = MemorySink::new();
        let options: IndexMap<String, FieldOption> = options
            .into_iter()
            .map(|(field, option)| (field.to_string(), option))
            .collect();
        let validated = validate_field_options(&options, &stats(), &*sink);
        (validated.keys().cloned().collect(), sink)
    }

    #[test]
    fn test_valid_options_are_kept() {
        let (kept, sink) = validate(vec![
            ("array", FieldOption::named("name")),
            ("object", FieldOption::named("name")),
            ("array", FieldOption::named_and_grouped("name")),
            ("plain", FieldOption::grouped()),
            ("object", FieldOption::grouped().with_separator("object", "; ")),
        ]);
        assert_eq!(kept, vec!["array", "object", "plain"]);
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn test_unknown_and_empty_options() {
        let (kept, sink) = validate(vec![
            ("missing", FieldOption::grouped()),
            ("array", FieldOption::default()),
        ]);
        assert!(kept.is_empty());
        assert!(sink.warned("this field doesn't exist"));
        assert!(sink.warned("must be either `named` or `grouped`"));
    }

    #[test]
    fn test_named_requirements() {
        let nameless = FieldOption {
            named: true,
            ..Default::default()
        };
        let (kept, sink) = validate(vec![
            ("array", nameless),
            ("plain", FieldOption::named("name")),
            ("object", FieldOption::named("missing")),
            ("limited", FieldOption::named("name")),
        ]);
        assert!(kept.is_empty());
        assert!(sink.warned("must include `name` parameter"));
        assert!(sink.warned("doesn't have any properties"));
        assert!(sink.warned("doesn't have name property \"missing\""));
        assert!(sink.warned("were limited by \"named_columns_limit\""));
    }

    #[test]
    fn test_named_and_grouped_ignores_limit_but_needs_array() {
        let (kept, sink) = validate(vec![
            ("limited", FieldOption::named_and_grouped("name")),
            ("object", FieldOption::named_and_grouped("name")),
        ]);
        assert_eq!(kept, vec!["limited"]);
        assert!(sink.warned("Only arrays of objects could be grouped and named"));
    }

    #[test]
    fn test_scalar_fields_are_rejected() {
        let (kept, sink) = validate(vec![("scalar", FieldOption::grouped())]);
        assert!(kept.is_empty());
        assert!(sink.warned("\"scalar\" only holds single values"));
    }

    #[test]
    fn test_separator_allow_list() {
        let (kept, sink) = validate(vec![(
            "plain",
            FieldOption::grouped().with_separator("plain", "|"),
        )]);
        assert!(kept.is_empty());
        assert!(sink.warned("custom grouped separators"));
    }

    #[test]
    fn test_filters_and_order() {
        let sink = MemorySink::new();
        let filters = compile_filters(&["name".to_string(), "(".to_string()], &*sink);
        assert_eq!(filters.len(), 1);
        assert!(filters[0].is_match("name_first"));
        assert!(!filters[0].is_match("first_name"));
        assert!(sink.warned("isn't a valid regex"));

        let order = validate_headers_order(&["b".to_string(), String::new()], &*sink);
        assert_eq!(order, vec!["b"]);
        assert!(sink.warned("Empty headers"));
    }

    #[test]
    fn test_renaming_rules() {
        let rules = compile_renaming(&[(r"^offers\[0\]->".to_string(), String::new())]).unwrap();
        assert_eq!(rules[0].0.replace_all("offers[0]->price", rules[0].1.as_str()), "price");

        let err = compile_renaming(&[("(".to_string(), String::new())]).unwrap_err();
        assert!(matches!(err, FlattenError::InvalidRenaming { pattern, .. } if pattern == "("));
    }
}
