//! Spreadsheet exports of the post table: native `.xlsx` and CSV.

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{HEADERS, Post, RowError};

/// Worksheet name used in native exports
pub const SHEET_NAME: &str = "Contentplanning";

/// Base file name for exports, extension added per format
pub const EXPORT_FILE_STEM: &str = "contentplanner";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to build workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unexpected CSV header: expected '{expected}', found '{found}'")]
    Header { expected: String, found: String },
    #[error("Invalid CSV line {line}: {source}")]
    Row { line: u64, source: RowError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    /// Default export file inside `dir`
    pub fn default_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{}", EXPORT_FILE_STEM, self.extension()))
    }
}

/// Workbook with one `Contentplanning` sheet: bold header row, then one row per post
pub fn to_xlsx(posts: &[Post]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (idx, post) in posts.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, value) in post.to_row().iter().enumerate() {
            // Dates stay text so they read back exactly as YYYY-MM-DD
            worksheet.write_string(row, col as u16, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Header line followed by one line per post
pub fn to_csv(posts: &[Post]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for post in posts {
        writer.write_record(post.to_row())?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Read posts back from a CSV export. The header must match exactly.
pub fn from_csv<R: Read>(reader: R) -> Result<Vec<Post>, ExportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = reader.headers()?.clone();
    let found: Vec<&str> = header.iter().map(|h| h.trim()).collect();
    if found != HEADERS {
        return Err(ExportError::Header {
            expected: HEADERS.join(","),
            found: found.join(","),
        });
    }

    let mut posts = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let cells: Vec<&str> = record.iter().collect();
        let post = Post::from_row(&cells).map_err(|source| ExportError::Row { line, source })?;
        posts.push(post);
    }
    Ok(posts)
}

/// Encode the posts in `format`
pub fn encode(posts: &[Post], format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Xlsx => to_xlsx(posts),
        ExportFormat::Csv => to_csv(posts),
    }
}

/// Encode and write to `path`, creating parent directories as needed
pub fn write_file(posts: &[Post], format: ExportFormat, path: &Path) -> Result<(), ExportError> {
    let bytes = encode(posts, format)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), rows = posts.len(), format = format.extension(), "exported posts");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_csv_has_only_the_header() {
        let bytes = to_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "Title,Status,Caption,Media Status,Deadline,Publish Date,Platform,Posted,Result\n"
        );
    }

    #[test]
    fn csv_quotes_captions_with_commas_and_newlines() {
        let mut post = Post::new("Launch", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        post.caption = "New drop, out now\n#launch".into();
        let bytes = to_csv(std::slice::from_ref(&post)).unwrap();
        let posts = from_csv(bytes.as_slice()).unwrap();
        assert_eq!(posts, vec![post]);
    }

    #[test]
    fn foreign_header_is_rejected() {
        let data = "Titel,Status\nfoo,Idee\n";
        assert!(matches!(from_csv(data.as_bytes()), Err(ExportError::Header { .. })));
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = to_xlsx(&[]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn default_paths_use_format_extension() {
        let dir = Path::new("/tmp/out");
        assert_eq!(
            ExportFormat::Csv.default_path(dir),
            PathBuf::from("/tmp/out/contentplanner.csv")
        );
    }
}
