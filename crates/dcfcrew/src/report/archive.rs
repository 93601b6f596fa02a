use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::ReportError;

pub const REPORT_ENTRY: &str = "valuation_report.docx";
pub const FORECAST_ENTRY: &str = "dcf_10_year_forecast.xlsx";

/// Writes `(name, bytes)` pairs into a deflated in-memory ZIP.
pub fn write_zip(entries: &[(&str, &[u8])]) -> Result<Vec<u8>, ReportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        zip.start_file(*name, options)
            .map_err(|e| ReportError::Zip(format!("Failed to start '{}': {}", name, e)))?;
        zip.write_all(bytes)
            .map_err(|e| ReportError::Zip(format!("Failed to write '{}': {}", name, e)))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| ReportError::Zip(format!("Failed to finish archive: {}", e)))?;
    Ok(cursor.into_inner())
}

/// Bundles the Word report and the forecast workbook into the download archive.
pub fn bundle_archive(report_docx: &[u8], forecast_xlsx: &[u8]) -> Result<Vec<u8>, ReportError> {
    write_zip(&[(REPORT_ENTRY, report_docx), (FORECAST_ENTRY, forecast_xlsx)])
}
