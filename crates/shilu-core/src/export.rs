/// Flat CSV export of the classified store.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{Local, TimeZone};
use tracing::info;

use crate::category::CategoryFilter;
use crate::error::CoreError;
use crate::store::ClassifiedStore;

pub const CSV_HEADER: [&str; 7] = [
    "Level1",
    "Level2",
    "Level3",
    "OriginalText",
    "Translation",
    "ArticleId",
    "Timestamp",
];

/// One export row. Text fields never contain line breaks.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub level1: String,
    pub level2: String,
    pub level3: String,
    pub original_text: String,
    pub translation: String,
    pub article_id: String,
    pub timestamp: String,
}

impl CsvRow {
    fn fields(&self) -> [&str; 7] {
        [
            self.level1.as_str(),
            self.level2.as_str(),
            self.level3.as_str(),
            self.original_text.as_str(),
            self.translation.as_str(),
            self.article_id.as_str(),
            self.timestamp.as_str(),
        ]
    }
}

/// Rows for every article selected by `filter`, in store order.
pub fn csv_rows(store: &ClassifiedStore, filter: &CategoryFilter) -> Vec<CsvRow> {
    store
        .filtered(filter)
        .into_iter()
        .map(|c| CsvRow {
            level1: c.path.level1.clone(),
            level2: c.path.level2.clone(),
            level3: c.path.level3.clone(),
            original_text: single_line(&c.article.original_text),
            translation: single_line(&c.article.translation),
            article_id: c.article.article_id.clone().unwrap_or_default(),
            timestamp: format_timestamp(c.article.timestamp),
        })
        .collect()
}

/// Write the header and `rows` as RFC 4180 CSV.
pub fn write_csv<W: Write>(mut out: W, rows: &[CsvRow]) -> std::io::Result<()> {
    write_record(&mut out, &CSV_HEADER)?;
    for row in rows {
        write_record(&mut out, &row.fields())?;
    }
    out.flush()
}

/// Export the articles selected by `filter` to `path`, returning the number of
/// data rows written. A filter that matches nothing still produces the header.
pub fn export_to_csv(
    store: &ClassifiedStore,
    path: &Path,
    filter: &CategoryFilter,
) -> Result<usize, CoreError> {
    let rows = csv_rows(store, filter);
    let export_err = |source| CoreError::Export {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(export_err)?;
    write_csv(BufWriter::new(file), &rows).map_err(export_err)?;

    info!(path = %path.display(), rows = rows.len(), "classified data exported");
    Ok(rows.len())
}

fn write_record<W: Write>(out: &mut W, fields: &[&str]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| quote_field(f))
        .collect::<Vec<_>>()
        .join(",");
    out.write_all(line.as_bytes())?;
    out.write_all(b"\r\n")
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Replace line breaks with spaces and trim.
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Local time as `%Y-%m-%d %H:%M:%S`; empty for out-of-range values.
fn format_timestamp(secs: f64) -> String {
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    Local
        .timestamp_opt(whole, nanos)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
