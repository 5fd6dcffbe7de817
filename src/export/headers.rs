//! Header generation
//!
//! Stats are turned into the flat header list in four steps: array limits,
//! per-field expansion, filters and ordering.

use crate::diagnostics::{Diagnostic, DiagnosticSink, Severity};
use crate::path;
use crate::types::{FieldOption, Header, Stats};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;

/// Clamp array counts to their limits and drop entries collected for the
/// elements beyond them
pub fn limit_field_elements(stats: &Stats, array_limits: &IndexMap<String, usize>) -> Stats {
    let mut stats = stats.clone();
    let mut filters = IndexSet::new();
    for (field, &limit) in array_limits {
        let Some(Header::Array { count, .. }) = stats.get_mut(field) else {
            continue;
        };
        if *count == 0 {
            continue;
        }
        for i in limit..*count {
            filters.insert(path::index(field, i));
        }
        *count = (*count).min(limit);
    }
    if filters.is_empty() {
        return stats;
    }
    stats.retain(|field, _| !filters.iter().any(|filter| field.starts_with(filter.as_str())));
    stats
}

/// Headers produced by a single stats entry
pub fn expand(
    field: &str,
    header: &Header,
    option: Option<&FieldOption>,
    separator: &str,
    sink: &dyn DiagnosticSink,
) -> Vec<String> {
    // Never populated, no content at all
    if header.is_unpopulated() {
        return vec![];
    }
    let properties = header.properties();
    let (named, grouped) = option.map_or((false, false), |o| (o.named, o.grouped));

    match (named, grouped) {
        // Everything is summarized in a single cell
        (true, true) => vec![field.to_string()],
        (true, false) => {
            let name = option.and_then(FieldOption::name_property).unwrap_or_default();
            let Some(named_property) = properties.and_then(|p| p.get(name)) else {
                return vec![];
            };
            if named_property.limited {
                sink.emit(
                    Diagnostic::new(
                        Severity::Warning,
                        format!("Named columns for field \"{}\" were limited, no columns created.", field),
                    )
                    .at(field),
                );
                return vec![];
            }
            // Such headers can't be split back into their pivot value at export
            for value in named_property.values.iter().filter(|v| v.contains(separator)) {
                sink.emit(
                    Diagnostic::new(
                        Severity::Warning,
                        format!(
                            "Value \"{}\" of name property \"{}\" contains the cut separator \"{}\", \
                             its named columns in field \"{}\" will stay empty.",
                            value, name, separator, field
                        ),
                    )
                    .at(field),
                );
            }
            let rest: Vec<&String> = properties
                .into_iter()
                .flat_map(|p| p.keys())
                .filter(|key| key.as_str() != name)
                .collect();
            named_property
                .values
                .iter()
                .flat_map(|value| {
                    rest.iter()
                        .map(move |key| format!("{field}{separator}{value}{separator}{key}"))
                })
                .collect()
        }
        (false, true) => match header {
            // One group per property of an array of objects
            Header::Array { properties, .. } if !properties.is_empty() => properties
                .keys()
                .map(|key| format!("{}{}{}", field, separator, key))
                .collect(),
            _ => vec![field.to_string()],
        },
        (false, false) => {
            let mut headers = vec![field.to_string()];
            if let Some(count) = header.count() {
                headers = (0..count).map(|i| path::index(field, i)).collect();
            }
            if let Some(properties) = properties.filter(|p| !p.is_empty()) {
                headers = headers
                    .iter()
                    .flat_map(|h| properties.keys().map(move |key| format!("{}{}{}", h, separator, key)))
                    .collect();
            }
            headers
        }
    }
}

/// Drop headers matching any filter
pub fn filter_headers(headers: Vec<String>, filters: &[Regex]) -> Vec<String> {
    if filters.is_empty() {
        return headers;
    }
    headers
        .into_iter()
        .filter(|header| !filters.iter().any(|filter| filter.is_match(header)))
        .collect()
}

/// Pull the listed headers to the front, in the listed order
pub fn sort_headers(mut headers: Vec<String>, order: &[String]) -> Vec<String> {
    if order.is_empty() {
        return headers;
    }
    let mut ordered = Vec::with_capacity(headers.len());
    for head in order {
        if let Some(position) = headers.iter().position(|h| h == head) {
            ordered.push(headers.remove(position));
        }
    }
    ordered.extend(headers);
    ordered
}
