// src/output/csv.rs
//! CSV output handler

use crate::output::OutputHandler;
use crate::types::ScanResult;
use anyhow::Context;
use async_trait::async_trait;
use std::io::Write;
use std::path::Path;

/// Header row of the scan CSV
pub const CSV_HEADER: [&str; 5] = ["IP", "ORIGIN", "CERT_DOMAIN", "CERT_ISSUER", "GEO_CODE"];

/// CSV output handler
///
/// Fields are never quoted; embedded quote characters are stripped instead.
pub struct CsvOutput {
    writer: ::csv::Writer<Box<dyn Write + Send>>,
}

impl CsvOutput {
    /// Create a CsvOutput over any writer and write the header
    pub fn new(writer: Box<dyn Write + Send>) -> anyhow::Result<Self> {
        let mut writer = ::csv::WriterBuilder::new()
            .quote_style(::csv::QuoteStyle::Never)
            .from_writer(writer);

        writer.write_record(CSV_HEADER)?;
        writer.flush()?;

        Ok(Self { writer })
    }

    /// Create (or truncate) a CSV file
    pub fn to_file(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Error opening file {}", path.display()))?;
        Self::new(Box::new(file))
    }

    /// Strip quote characters from a field
    fn sanitize_field(field: &str) -> String {
        field.replace('"', "")
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn emit_result(&mut self, result: &ScanResult) -> anyhow::Result<()> {
        let record = result.to_record().map(Self::sanitize_field);

        self.writer.write_record(&record)?;
        self.writer.flush()?;
        Ok(())
    }

    async fn flush(&mut self) -> anyhow::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
