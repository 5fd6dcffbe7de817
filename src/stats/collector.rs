use crate::classify::{is_scalar, kind_name, stringify, Shape};
use crate::config::CollectorConfig;
use crate::diagnostics::{default_sink, Diagnostic, DiagnosticSink, Severity};
use crate::error::{FlattenError, Result};
use crate::path;
use crate::stats::replay::ReplayBuffer;
use crate::types::{CollectedStats, Header, InvalidProperties, Stats};
use indexmap::IndexSet;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Collects per-path stats from records to find the columns required for
/// every field, and the values needed for named/grouped field options.
///
/// Records can be fed as a batch ([`process_items`](Self::process_items)) or
/// one by one ([`process_object`](Self::process_object)); both end in the
/// same state.
pub struct StatsCollector {
    config: CollectorConfig,
    stats: Stats,
    invalid_properties: InvalidProperties,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl StatsCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self::with_diagnostics(config, default_sink())
    }

    pub fn with_diagnostics(config: CollectorConfig, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        StatsCollector {
            config,
            stats: Stats::new(),
            invalid_properties: InvalidProperties::new(),
            diagnostics,
        }
    }

    /// Collected stats without never-populated entries, plus invalid paths
    pub fn stats(&self) -> CollectedStats {
        CollectedStats {
            stats: self
                .stats
                .iter()
                .filter(|(_, header)| !header.is_unpopulated())
                .map(|(path, header)| (path.clone(), header.clone()))
                .collect(),
            invalid_properties: self.invalid_properties.clone(),
        }
    }

    pub fn invalid_properties(&self) -> &InvalidProperties {
        &self.invalid_properties
    }

    /// Validate a batch and collect stats for every record in it.
    ///
    /// The batch must be an array of objects. Anything else is a caller
    /// error and nothing is collected.
    pub fn process_items(&mut self, items: &Value) -> Result<()> {
        let Value::Array(items) = items else {
            return Err(FlattenError::NotAnArray(kind_name(items)));
        };
        if items.is_empty() {
            self.emit(Severity::Warning, None, "No items provided.".to_string());
            return Ok(());
        }

        let kinds: IndexSet<&'static str> = items.iter().map(kind_name).collect();
        if kinds.len() > 1 {
            return Err(FlattenError::MixedItemTypes(kinds.into_iter().collect()));
        }

        match &items[0] {
            Value::Object(_) => {
                for item in items.iter().filter_map(Value::as_object) {
                    self.process_object(item, "");
                }
                Ok(())
            }
            Value::Array(_) => Err(FlattenError::NestedArrays),
            other => Err(FlattenError::UnsupportedItemType(kind_name(other))),
        }
    }

    /// Merge an object found at `prefix` into the stats (`""` for a record)
    pub fn process_object(&mut self, object: &Map<String, Value>, prefix: &str) {
        if self.is_invalid(prefix) || object.is_empty() {
            return;
        }

        match self.stats.get(prefix) {
            // Non-scalar values were seen here before, keep expanding per key
            Some(Header::Degenerate) => {
                self.base_object(object, prefix, true);
                return;
            }
            Some(Header::Array { .. }) => {
                self.mark_drift(
                    prefix,
                    format!(
                        "Field ({}) value changed the type from \"array\" to object: ({})",
                        prefix,
                        Value::Object(object.clone())
                    ),
                );
                return;
            }
            _ => {}
        }

        // The record root never gets a descriptor of its own
        if !prefix.is_empty() && object.values().all(is_scalar) {
            self.hashable_object(object, prefix);
            return;
        }

        // All-scalar so far: demote the descriptor and keep what it collected
        let replay = match self.stats.get(prefix) {
            Some(header) if header.has_properties() => header.properties().map(ReplayBuffer::capture),
            _ => None,
        };
        if let Some(buffer) = replay {
            self.emit(
                Severity::Debug,
                Some(prefix),
                format!("Rebuilding stats for ({}) from {} collected values", prefix, buffer.len()),
            );
            self.stats.shift_remove(prefix);
            for (name, value) in buffer.iter() {
                self.base_property(prefix, name, value, false);
            }
        }

        if !prefix.is_empty() {
            self.stats.insert(prefix.to_string(), Header::Degenerate);
        }
        self.base_object(object, prefix, true);
    }

    fn base_object(&mut self, object: &Map<String, Value>, prefix: &str, check_kinds: bool) {
        for (name, value) in object {
            self.base_property(prefix, name, value, check_kinds);
        }
    }

    fn base_property(&mut self, prefix: &str, name: &str, value: &Value, check_kinds: bool) {
        // Null says nothing about the column
        if value.is_null() {
            return;
        }
        let property_path = path::join(prefix, name, &self.config.cut_separator);
        let shape = Shape::of(value);

        let existing = self.stats.get(&property_path);
        if check_kinds {
            match (shape, existing) {
                (Shape::Scalar, Some(header)) if *header != Header::Scalar => {
                    self.mark_drift(
                        &property_path,
                        format!(
                            "Field ({}) was processed as non-hashable but later got hashable value: ({})",
                            property_path, value
                        ),
                    );
                    return;
                }
                (Shape::Sequence | Shape::Mapping, Some(Header::Scalar)) => {
                    self.mark_drift(
                        &property_path,
                        format!(
                            "Field ({}) was processed as hashable but later got non-hashable value: ({})",
                            property_path, value
                        ),
                    );
                    return;
                }
                _ => {}
            }
        }

        let expected = match self.stats.get(&property_path) {
            Some(header @ Header::Array { .. }) => Some((Shape::Sequence, header.kind())),
            Some(header @ (Header::Object { .. } | Header::Degenerate)) => Some((Shape::Mapping, header.kind())),
            _ => None,
        };
        if let Some((expected_shape, kind)) = expected {
            if expected_shape != shape && !self.is_invalid(&property_path) {
                self.mark_drift(
                    &property_path,
                    format!(
                        "Field ({}) value changed the type from \"{}\" to {}: ({})",
                        property_path,
                        kind,
                        kind_name(value),
                        value
                    ),
                );
                return;
            }
        }

        match value {
            Value::Array(array) => self.process_array(array, &property_path),
            Value::Object(object) => self.process_object(object, &property_path),
            _ => {
                self.stats.entry(property_path).or_insert(Header::Scalar);
            }
        }
    }

    fn process_array(&mut self, array: &[Value], prefix: &str) {
        // Nothing to learn, or the column will be stringified anyway
        if array.is_empty()
            || (self.is_invalid(prefix) && matches!(self.stats.get(prefix), Some(Header::Scalar)))
        {
            return;
        }

        let mappings = array.iter().filter(|v| v.is_object()).count();
        let sequences = array.iter().filter(|v| v.is_array()).count();
        for (count, label) in [(mappings, "Objects"), (sequences, "Arrays")] {
            if count > 0 && count < array.len() {
                let message = format!("{} can't be mixed with other types in an array ({}).", label, prefix);
                self.emit(Severity::Warning, Some(prefix), message.clone());
                self.invalid_properties.insert(prefix.to_string(), message);
                break;
            }
        }

        match self.stats.get(prefix) {
            None => {
                self.stats.insert(prefix.to_string(), Header::empty_array());
            }
            Some(Header::Array { .. }) => {}
            Some(header) => {
                let message = format!(
                    "Field ({}) value changed the type from \"{}\" to array: ({})",
                    prefix,
                    header.kind(),
                    Value::Array(array.to_vec())
                );
                self.mark_drift(prefix, message);
                return;
            }
        }

        // Invalid arrays only need a count, they are stringified or skipped
        if is_scalar(&array[0]) || self.is_invalid(prefix) {
            self.bump_count(prefix, array.len());
        } else if array[0].is_array() {
            for (i, element) in array.iter().enumerate() {
                if let Some(inner) = element.as_array() {
                    self.process_array(inner, &path::index(prefix, i));
                }
            }
        } else {
            self.base_array(array, prefix);
        }
    }

    /// Array of objects: scalar properties are collected on the array itself,
    /// nested containers get their own `prefix[i]->name` paths
    fn base_array(&mut self, array: &[Value], prefix: &str) {
        let mut has_scalar = false;
        for (i, element) in array.iter().enumerate() {
            let Some(object) = element.as_object() else {
                continue;
            };
            for (name, value) in object {
                let property_path = path::join(&path::index(prefix, i), name, &self.config.cut_separator);
                if self.is_invalid(&property_path) {
                    continue;
                }
                match value {
                    Value::Null => {}
                    Value::Array(inner) => self.process_array(inner, &property_path),
                    Value::Object(inner) => self.process_object(inner, &property_path),
                    _ => {
                        self.hashable_value(prefix, name, value);
                        has_scalar = true;
                    }
                }
            }
        }

        // Count only matters when there are properties to lay out per element
        let has_properties = self.stats.get(prefix).is_some_and(Header::has_properties);
        if has_properties || has_scalar {
            self.bump_count(prefix, array.len());
        }
    }

    fn hashable_object(&mut self, object: &Map<String, Value>, prefix: &str) {
        // All-null objects carry no information, like a plain null
        if object.values().all(Value::is_null) {
            return;
        }
        if matches!(self.stats.get(prefix), None | Some(Header::Scalar)) {
            self.stats.insert(prefix.to_string(), Header::empty_object());
        }
        for (name, value) in object {
            if !value.is_null() {
                self.hashable_value(prefix, name, value);
            }
        }
    }

    fn hashable_value(&mut self, prefix: &str, name: &str, value: &Value) {
        let limit = self.config.named_columns_limit;
        let Some(properties) = self.stats.get_mut(prefix).and_then(Header::properties_mut) else {
            return;
        };
        let property = properties.entry(name.to_string()).or_default();
        if property.limited {
            return;
        }
        property.values.insert(stringify(value));
        // Too many named columns: forget the partial values for good
        if property.values.len() > limit {
            property.values.clear();
            property.limited = true;
        }
    }

    fn bump_count(&mut self, prefix: &str, len: usize) {
        if let Some(Header::Array { count, .. }) = self.stats.get_mut(prefix) {
            *count = (*count).max(len);
        }
    }

    /// Record a type change at `path`; its column falls back to a single
    /// stringified cell and every header collected below it is dropped.
    fn mark_drift(&mut self, path: &str, message: String) {
        self.emit(Severity::Warning, Some(path), message.clone());
        self.invalid_properties.insert(path.to_string(), message);
        self.clear_outdated_stats(path);
        self.stats.insert(path.to_string(), Header::Scalar);
    }

    fn clear_outdated_stats(&mut self, prefix: &str) {
        let separator = self.config.cut_separator.as_str();
        self.stats
            .retain(|path, _| !path::is_descendant(path, prefix, separator));
    }

    fn is_invalid(&self, path: &str) -> bool {
        self.invalid_properties.contains_key(path)
    }

    fn emit(&self, severity: Severity, path: Option<&str>, message: String) {
        let mut diagnostic = Diagnostic::new(severity, message);
        if let Some(path) = path {
            diagnostic = diagnostic.at(path);
        }
        self.diagnostics.emit(diagnostic);
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new(CollectorConfig::default())
    }
}
