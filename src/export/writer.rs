use crate::error::{FlattenError, Result};
use crate::export::Exporter;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Writes an exporter's headers and rows as CSV: comma separated, quoted
/// only when needed, one record per line
pub struct CsvExport<'a, W: Write> {
    exporter: &'a Exporter,
    writer: csv::Writer<W>,
}

impl<'a, W: Write> CsvExport<'a, W> {
    pub fn new(exporter: &'a Exporter, writer: W) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(b',')
            .quote(b'"')
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        CsvExport { exporter, writer }
    }

    /// Renamed headers
    pub fn write_headers(&mut self) -> Result<()> {
        self.writer.write_record(self.exporter.renamed_headers())?;
        Ok(())
    }

    pub fn write_row(&mut self, item: &Value) -> Result<()> {
        self.writer.write_record(self.exporter.export_item_as_row(item))?;
        Ok(())
    }

    /// Headers followed by one row per item
    pub fn write_all<'v, I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = &'v Value>,
    {
        self.write_headers()?;
        for item in items {
            self.write_row(item)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| FlattenError::Io(err.into_error()))
    }
}

fn open(path: &Path, append: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    Ok(options.open(path)?)
}

impl Exporter {
    fn export_to_file<F>(&self, path: &Path, append: bool, write: F) -> Result<()>
    where
        F: FnOnce(&mut CsvExport<'_, File>) -> Result<()>,
    {
        let mut export = CsvExport::new(self, open(path, append)?);
        write(&mut export)?;
        export.flush()
    }

    pub fn export_csv_headers(&self, path: impl AsRef<Path>, append: bool) -> Result<()> {
        self.export_to_file(path.as_ref(), append, |export| export.write_headers())
    }

    pub fn export_csv_row(&self, item: &Value, path: impl AsRef<Path>, append: bool) -> Result<()> {
        self.export_to_file(path.as_ref(), append, |export| export.write_row(item))
    }

    pub fn export_csv_full(&self, items: &[Value], path: impl AsRef<Path>, append: bool) -> Result<()> {
        self.export_to_file(path.as_ref(), append, |export| export.write_all(items))
    }
}
