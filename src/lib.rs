//! # Flatline - JSON to CSV flattening
//!
//! Infers a stable tabular layout from heterogeneous JSON records and renders
//! every record as a row of that layout.
//!
//! ## Modules
//!
//! - **stats**: walk records and collect one shape descriptor per field path
//! - **export**: expand the collected stats into headers and records into rows
//! - **classify** / **path**: value classification and field path helpers
//!
//! ## Quick Start
//!
//! ```rust
//! use flatline::{CollectorConfig, ExportConfig, Exporter, FieldOption, StatsCollector};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let items = json!([
//!     {"c": [{"name": "color", "value": "green"}, {"name": "size", "value": "XL"}]}
//! ]);
//!
//! let mut collector = StatsCollector::new(CollectorConfig::default());
//! collector.process_items(&items)?;
//!
//! let mut config = ExportConfig::default();
//! config.field_options.insert("c".to_string(), FieldOption::named("name"));
//! let exporter = Exporter::new(collector.stats(), config)?;
//!
//! assert_eq!(exporter.headers(), &["c->color->value", "c->size->value"]);
//! assert_eq!(exporter.export_item_as_row(&items[0]), vec!["green", "XL"]);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;

pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod path;
pub mod stats;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{CollectorConfig, Config, ExportConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, Severity, TracingSink};
pub use error::FlattenError;
pub use export::{CsvExport, Exporter};
pub use stats::StatsCollector;
pub use types::{CollectedStats, FieldOption, Header, Property, Stats};

/// Main entry point: collect stats for a batch, then write it as CSV
pub fn json_to_csv<W: Write>(items: &Value, config: &Config, writer: W) -> Result<CollectedStats> {
    let mut collector = StatsCollector::new(config.collector.clone());
    collector
        .process_items(items)
        .context("Failed to collect stats")?;
    let stats = collector.stats();

    // Both phases must split paths the same way
    let mut export_config = config.export.clone();
    export_config.cut_separator = config.collector.cut_separator.clone();
    let exporter = Exporter::new(stats.clone(), export_config).context("Failed to prepare export")?;

    let mut export = CsvExport::new(&exporter, writer);
    export
        .write_all(items.as_array().into_iter().flatten())
        .context("Failed to write CSV")?;
    export.flush().context("Failed to flush CSV")?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers_and_rows(items: &Value, export_config: ExportConfig) -> (Vec<String>, Vec<Vec<String>>) {
        let mut collector = StatsCollector::default();
        collector.process_items(items).unwrap();
        let exporter = Exporter::new(collector.stats(), export_config).unwrap();
        let rows = items
            .as_array()
            .unwrap()
            .iter()
            .map(|item| exporter.export_item_as_row(item))
            .collect();
        (exporter.headers().to_vec(), rows)
    }

    fn named(field: &str, option: FieldOption) -> ExportConfig {
        let mut config = ExportConfig::default();
        config.field_options.insert(field.to_string(), option);
        config
    }

    #[test]
    fn test_object_fields_become_columns() {
        let (headers, rows) = headers_and_rows(
            &json!([{"c": {"name": "color", "value": "green"}}]),
            ExportConfig::default(),
        );
        assert_eq!(headers, vec!["c->name", "c->value"]);
        assert_eq!(rows, vec![vec!["color", "green"]]);
    }

    #[test]
    fn test_named_object_field() {
        let (headers, rows) = headers_and_rows(
            &json!([{"c": {"name": "color", "value": "green"}}]),
            named("c", FieldOption::named("name")),
        );
        assert_eq!(headers, vec!["c->color->value"]);
        assert_eq!(rows, vec![vec!["green"]]);
    }

    #[test]
    fn test_named_and_grouped_array() {
        let (headers, rows) = headers_and_rows(
            &json!([{"c": [{"name": "color", "value": "green"}, {"name": "size", "value": "XL"}]}]),
            named("c", FieldOption::named_and_grouped("name")),
        );
        assert_eq!(headers, vec!["c"]);
        assert_eq!(rows, vec![vec!["color: green\nsize: XL"]]);
    }

    #[test]
    fn test_object_later_gets_a_list() {
        let (headers, rows) = headers_and_rows(
            &json!([
                {"c": {"name": "color", "value": "green"}},
                {"c": {"name": "color", "value": "blue", "list": [1, 2]}}
            ]),
            ExportConfig::default(),
        );
        assert_eq!(headers, vec!["c->name", "c->value", "c->list[0]", "c->list[1]"]);
        assert_eq!(
            rows,
            vec![vec!["color", "green", "", ""], vec!["color", "blue", "1", "2"]]
        );
    }

    #[test]
    fn test_array_grows_across_records() {
        let items = json!([{"c": [1, 2]}, {"c": [1, 2, 3]}]);
        let mut collector = StatsCollector::default();
        collector.process_items(&items).unwrap();
        assert_eq!(collector.stats().stats["c"].count(), Some(3));

        let (headers, rows) = headers_and_rows(&items, ExportConfig::default());
        assert_eq!(headers, vec!["c[0]", "c[1]", "c[2]"]);
        assert_eq!(rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn test_scalar_fields_round_trip() {
        let items = json!([
            {"id": 1, "price": 9.5, "title": "Ünïcode, with comma", "active": true},
            {"id": 2, "price": 10, "title": "plain", "active": false}
        ]);
        let (headers, rows) = headers_and_rows(&items, ExportConfig::default());
        assert_eq!(headers, vec!["id", "price", "title", "active"]);
        assert_eq!(rows[0], vec!["1", "9.5", "Ünïcode, with comma", "true"]);
        assert_eq!(rows[1], vec!["2", "10", "plain", "false"]);
    }

    #[test]
    fn test_empty_keys_keep_their_values() {
        let (headers, rows) = headers_and_rows(
            &json!([{"c": {"": 1, "b": {"x": [1]}}}]),
            ExportConfig::default(),
        );
        assert_eq!(headers, vec!["c->", "c->b->x[0]"]);
        assert_eq!(rows, vec![vec!["1", "1"]]);

        let (headers, rows) = headers_and_rows(&json!([{"": 5, "a": 1}]), ExportConfig::default());
        assert_eq!(headers, vec!["", "a"]);
        assert_eq!(rows, vec![vec!["5", "1"]]);
    }

    #[test]
    fn test_json_to_csv() {
        let items = json!([
            {"name": "Alice", "tags": ["a", "b"]},
            {"name": "Bob", "tags": ["c"]}
        ]);
        let mut output = Vec::new();
        let stats = json_to_csv(&items, &Config::default(), &mut output).unwrap();

        assert_eq!(stats.stats["tags"].count(), Some(2));
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "name,tags[0],tags[1]\nAlice,a,b\nBob,c,\n"
        );
    }

    #[test]
    fn test_json_to_csv_rejects_bad_batches() {
        let mut output = Vec::new();
        let err = json_to_csv(&json!({"name": "Alice"}), &Config::default(), &mut output).unwrap_err();
        assert!(err.downcast_ref::<FlattenError>().is_some());
        assert!(output.is_empty());
    }
}
