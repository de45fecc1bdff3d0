//! # Export Writer
//!
//! Serializes the final table for download, either as a single-sheet Excel
//! workbook or as comma-separated text.
use crate::error::{ResultMessage, RustyMergeError};
use crate::loader::FormatError;
use crate::table::Table;
use log::info;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

mod delimited;
mod xlsx;

pub use delimited::to_csv_bytes;
pub use xlsx::{to_xlsx_bytes, SHEET_NAME};

/// File name offered when the user does not pick one.
pub const DEFAULT_FILE_STEM: &str = "merge_result";

/// Output formats.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// Picks the format from a file name extension, ignoring case.
    pub fn detect(filename: &str) -> Result<ExportFormat, FormatError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx") => Ok(ExportFormat::Xlsx),
            Some("csv") => Ok(ExportFormat::Csv),
            _ => Err(FormatError::UnsupportedExtension {
                name: filename.to_owned(),
            }),
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    /// Default output file name for this format.
    pub fn default_filename(&self) -> String {
        format!("{}.{}", DEFAULT_FILE_STEM, self.extension())
    }
}

/// Serializes a table in the given format.
pub fn export(table: &Table, format: ExportFormat) -> Result<Vec<u8>, RustyMergeError> {
    match format {
        ExportFormat::Xlsx => to_xlsx_bytes(table),
        ExportFormat::Csv => to_csv_bytes(table),
    }
}

/// Makes a user-supplied name safe to use as a file name.
///
/// Path separators and other characters outside letters, digits, `.`, `-`
/// and `_` are replaced by `_`; leading dots are removed. An empty result
/// falls back to the default file stem.
pub fn sanitize_filename(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_characters = UNSAFE.get_or_init(|| Regex::new(r"[^\w.\-]+").expect("Hardcode pattern"));
    let cleaned = unsafe_characters.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() || cleaned.chars().all(|character| character == '_') {
        DEFAULT_FILE_STEM.to_owned()
    } else {
        cleaned.to_owned()
    }
}

/// Writes a table to `path`, choosing the format from its extension.
pub fn write_file<P: AsRef<Path>>(table: &Table, path: P) -> Result<PathBuf, RustyMergeError> {
    let path = path.as_ref();
    let format = ExportFormat::detect(&path.to_string_lossy())?;
    let bytes = export(table, format)?;
    std::fs::write(path, &bytes)
        .map_err(RustyMergeError::from)
        .with_prefix(&format!("Failed to write '{}'", path.display()))?;
    info!(
        "Wrote {} rows x {} columns to '{}' ({} bytes)",
        table.row_count(),
        table.column_count(),
        path.display(),
        bytes.len()
    );
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("merge_result.xlsx"), "merge_result.xlsx");
        assert_eq!(sanitize_filename("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_filename("my report (v2).csv"), "my_report_v2_.csv");
        assert_eq!(sanitize_filename("résumé.xlsx"), "résumé.xlsx");
        assert_eq!(sanitize_filename("///"), DEFAULT_FILE_STEM);
        assert_eq!(sanitize_filename(""), DEFAULT_FILE_STEM);
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ExportFormat::detect("out.XLSX").unwrap(), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::detect("out.csv").unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::detect("out.xls").is_err());
        assert_eq!(ExportFormat::Csv.default_filename(), "merge_result.csv");
    }
}
