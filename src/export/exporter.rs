use crate::config::ExportConfig;
use crate::diagnostics::{default_sink, Diagnostic, DiagnosticSink, Severity};
use crate::error::Result;
use crate::export::{headers, options, row};
use crate::types::{CollectedStats, FieldOption, InvalidProperties, Stats};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// Turns collected stats into CSV headers and records into rows.
///
/// Headers are computed once, on first access, and reused for every row.
pub struct Exporter {
    stats: Stats,
    invalid_properties: InvalidProperties,
    config: ExportConfig,
    field_options: IndexMap<String, FieldOption>,
    headers_order: Vec<String>,
    filters: Vec<Regex>,
    renaming: Vec<(Regex, String)>,
    headers: OnceCell<Vec<String>>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Exporter {
    pub fn new(stats: CollectedStats, config: ExportConfig) -> Result<Self> {
        Self::with_diagnostics(stats, config, default_sink())
    }

    pub fn with_diagnostics(
        stats: CollectedStats,
        config: ExportConfig,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        let CollectedStats {
            stats,
            invalid_properties,
        } = stats;
        let renaming = options::compile_renaming(&config.headers_renaming)?;
        let sink: &dyn DiagnosticSink = &*diagnostics;
        announce_invalid_properties(&invalid_properties, config.stringify_invalid, sink);
        let field_options = options::validate_field_options(&config.field_options, &stats, sink);
        let headers_order = options::validate_headers_order(&config.headers_order, sink);
        let filters = options::compile_filters(&config.headers_filters, sink);

        Ok(Exporter {
            stats,
            invalid_properties,
            config,
            field_options,
            headers_order,
            filters,
            renaming,
            headers: OnceCell::new(),
            diagnostics,
        })
    }

    /// Field options that survived validation
    pub fn field_options(&self) -> &IndexMap<String, FieldOption> {
        &self.field_options
    }

    /// Headers in export order, before renaming
    pub fn headers(&self) -> &[String] {
        self.headers.get_or_init(|| self.prepare_headers())
    }

    fn prepare_headers(&self) -> Vec<String> {
        let stats = headers::limit_field_elements(&self.stats, &self.config.array_limits);
        let separator = self.config.cut_separator.as_str();
        let sink: &dyn DiagnosticSink = &*self.diagnostics;

        let expanded = stats
            .iter()
            .filter(|(field, _)| self.config.stringify_invalid || !self.invalid_properties.contains_key(*field))
            .flat_map(|(field, header)| {
                headers::expand(field, header, self.field_options.get(field), separator, sink)
            })
            .collect();

        let filtered = headers::filter_headers(expanded, &self.filters);
        headers::sort_headers(filtered, &self.headers_order)
    }

    /// Headers as written to the CSV file: renaming rules, then capitalization
    pub fn renamed_headers(&self) -> Vec<String> {
        self.headers()
            .iter()
            .map(|header| {
                let mut renamed = header.clone();
                for (pattern, replacement) in &self.renaming {
                    renamed = pattern.replace_all(&renamed, replacement.as_str()).into_owned();
                }
                if self.config.capitalize_headers {
                    renamed = capitalize(&renamed);
                }
                renamed
            })
            .collect()
    }

    /// One cell per header for `item`; lookups that miss give empty cells
    pub fn export_item_as_row(&self, item: &Value) -> Vec<String> {
        self.headers()
            .iter()
            .map(|header| self.export_cell(item, header))
            .collect()
    }

    fn export_cell(&self, item: &Value, header: &str) -> String {
        let separator = self.config.cut_separator.as_str();
        if self.config.stringify_invalid && self.invalid_properties.contains_key(header) {
            return row::lookup_cell(item, header, separator);
        }

        let parts: Vec<&str> = header.split(separator).collect();
        let mut main: Option<(String, &FieldOption, usize)> = None;
        for i in 0..parts.len() {
            let option_path = parts[..=i].join(separator);
            let Some(option) = self.field_options.get(&option_path) else {
                continue;
            };
            if main.is_none() {
                main = Some((option_path, option, i + 1));
                continue;
            }
            if let Some((main_header, _, _)) = &main {
                self.diagnostics.emit(
                    Diagnostic::new(
                        Severity::Debug,
                        format!(
                            "Field option for field \"{}\" would be ignored because option for higher level field \"{}\" exists.",
                            option_path, main_header
                        ),
                    )
                    .at(option_path.as_str()),
                );
            }
        }

        let Some((main_header, option, child_start)) = main else {
            return row::lookup_cell(item, header, separator);
        };
        let child = &parts[child_start..];
        let value = crate::path::lookup(item, &main_header, separator);
        let name = option.name_property().unwrap_or_default();

        match (option.named, option.grouped) {
            (named, true) => {
                let grouped_separator = option
                    .grouped_separators
                    .get(header)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(&self.config.grouped_separator);
                if named {
                    row::grouped_named_cell(value, name, self.stats.get(&main_header), grouped_separator)
                } else {
                    row::grouped_cell(value, child, grouped_separator)
                }
            }
            (true, false) => row::named_cell(value, name, child),
            (false, false) => String::new(),
        }
    }
}

fn announce_invalid_properties(
    invalid_properties: &InvalidProperties,
    stringify_invalid: bool,
    sink: &dyn DiagnosticSink,
) {
    if invalid_properties.is_empty() {
        return;
    }
    let action = if stringify_invalid { "stringified" } else { "skipped" };
    sink.emit(Diagnostic::new(
        Severity::Info,
        format!("Columns with invalid data would be {}.", action),
    ));
    for (path, reason) in invalid_properties {
        let message = if stringify_invalid {
            format!(
                "All the data in column \"{}\" would be stringified because of data errors:\n{}",
                path, reason
            )
        } else {
            format!("Column \"{}\" would be skipped because of data errors:\n{}", path, reason)
        };
        sink.emit(Diagnostic::new(Severity::Info, message).at(path.as_str()));
    }
}

fn capitalize(header: &str) -> String {
    let mut chars = header.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
