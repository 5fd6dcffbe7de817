use crate::types::FieldOption;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CUT_SEPARATOR: &str = "->";
pub const DEFAULT_GROUPED_SEPARATOR: &str = "\n";
pub const DEFAULT_NAMED_COLUMNS_LIMIT: usize = 20;

/// Configuration for stats collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// How many distinct values a property may have before named columns
    /// are given up for it
    pub named_columns_limit: usize,

    /// Separator between path components; replace it if property names
    /// contain the default one
    pub cut_separator: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            named_columns_limit: DEFAULT_NAMED_COLUMNS_LIMIT,
            cut_separator: String::from(DEFAULT_CUT_SEPARATOR),
        }
    }
}

/// Configuration for header generation and row export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Stringify columns with invalid data (true) or skip them (false)
    pub stringify_invalid: bool,

    /// Field path -> formatting option
    pub field_options: IndexMap<String, FieldOption>,

    /// Export only the first N elements of these arrays (`{"offers": 1}`)
    pub array_limits: IndexMap<String, usize>,

    /// Ordered (pattern, replacement) rules applied to every header
    pub headers_renaming: Vec<(String, String)>,

    /// Headers to pull to the front, in this order (pre-renaming form)
    pub headers_order: Vec<String>,

    /// Headers matching any of these regexes are dropped
    pub headers_filters: Vec<String>,

    /// Separator between values grouped into a single cell
    pub grouped_separator: String,

    /// Must match the collector's separator
    pub cut_separator: String,

    /// Upper-case the first letter of every exported header
    pub capitalize_headers: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            stringify_invalid: true,
            field_options: IndexMap::new(),
            array_limits: IndexMap::new(),
            headers_renaming: vec![],
            headers_order: vec![],
            headers_filters: vec![],
            grouped_separator: String::from(DEFAULT_GROUPED_SEPARATOR),
            cut_separator: String::from(DEFAULT_CUT_SEPARATOR),
            capitalize_headers: false,
        }
    }
}

/// Both phases' settings, as loaded from a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collector: CollectorConfig,
    pub export: ExportConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.collector.named_columns_limit, 20);
        assert_eq!(config.collector.cut_separator, "->");
        assert!(config.export.stringify_invalid);
        assert_eq!(config.export.grouped_separator, "\n");
    }

    #[test]
    fn test_partial_config() {
        let config: Config = serde_json::from_value(json!({
            "collector": {"named_columns_limit": 50},
            "export": {
                "array_limits": {"offers": 1},
                "headers_renaming": [["^offers\\[0\\]->", ""]],
                "field_options": {"gtin": {"named": true, "name": "type"}}
            }
        }))
        .unwrap();

        assert_eq!(config.collector.named_columns_limit, 50);
        assert_eq!(config.collector.cut_separator, "->");
        assert_eq!(config.export.array_limits["offers"], 1);
        assert_eq!(
            config.export.headers_renaming,
            vec![("^offers\\[0\\]->".to_string(), String::new())]
        );
        assert_eq!(config.export.field_options["gtin"], FieldOption::named("type"));
        assert!(config.export.stringify_invalid);
    }
}
