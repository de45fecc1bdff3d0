//! # Table Loader
//!
//! Turns the bytes of an uploaded file into a [`Table`]. The format is chosen
//! from the file extension (case-insensitive):
//!
//! - `.csv` - comma-separated text, first record is the header
//! - `.xlsx` - Excel 2007+ workbook, first used row of the sheet is the header
//! - `.xls` - legacy Excel workbook, same layout as `.xlsx`
//!
//! Duplicate header names are made unique (`x`, `x.1`, `x.2`) and empty header
//! cells are named `Unnamed: <index>`.
use crate::error::RustyMergeError;
use crate::loader::spreadsheet::Spreadsheet;
use crate::table::{Table, ValidationError};
use calamine::{XlsError, XlsxError};
use log::info;
use std::collections::HashSet;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

mod delimited;
pub mod infer;
mod spreadsheet;

pub use infer::ColumnKind;

/// Default size limit for a single input file, in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 100;

/// Errors raised when a file type is not supported.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Unsupported or unrecognized file extension
    #[error("Unsupported file type for '{name}': expected .csv, .xlsx or .xls")]
    UnsupportedExtension { name: String },

    /// A workbook operation was requested for delimited text
    #[error("'{name}' is not a workbook")]
    NotAWorkbook { name: String },
}

/// Errors raised when file content is malformed.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Malformed delimited text
    #[error("Invalid csv content: {0}")]
    InvalidCsv(#[from] csv::Error),

    /// Error in Excel 2007+ format (.xlsx)
    #[error("Invalid xlsx file format: {0}")]
    InvalidXlsxFileFormat(#[from] XlsxError),

    /// Error in legacy Excel format (.xls)
    #[error("Invalid xls file format: {0}")]
    InvalidXlsFileFormat(#[from] XlsError),

    /// Requested sheet not found or workbook has no sheets
    #[error("Sheet '{name}' not found")]
    SheetNotFound { name: String },

    /// File or sheet holds no header row
    #[error("Missing header row")]
    MissingHeaderRow,

    /// A record has more fields than the header
    #[error("Line {line} has {found} fields, expected at most {expected}")]
    TooManyFields { line: u64, expected: usize, found: usize },

    /// Invalid cell value that cannot be converted
    #[error("Invalid cell value at '{position}': {message}")]
    InvalidCellValue { position: String, message: String },
}

/// Supported input formats.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Detects the format from a file name extension, ignoring case.
    pub fn detect(filename: &str) -> Result<FileFormat, FormatError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") => Ok(FileFormat::Xlsx),
            Some("xls") => Ok(FileFormat::Xls),
            _ => Err(FormatError::UnsupportedExtension {
                name: filename.to_owned(),
            }),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Xls => "xls",
        }
    }
}

impl Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options controlling how a file becomes a table.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadOptions {
    /// Sheet to read from a workbook; the first sheet when unset
    pub sheet_name: Option<String>,
    /// Read every cell as the text it displays instead of inferring types
    pub preserve_format: bool,
    /// Reject inputs larger than this many bytes
    pub max_size_bytes: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            sheet_name: None,
            preserve_format: true,
            max_size_bytes: Some(DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024),
        }
    }
}

impl LoadOptions {
    /// Fails when `size` bytes exceed the limit.
    pub fn check_size(&self, filename: &str, size: usize) -> Result<(), ValidationError> {
        match self.max_size_bytes {
            Some(limit) if size > limit => Err(ValidationError::FileTooLarge {
                name: filename.to_owned(),
                size,
                limit,
            }),
            _ => Ok(()),
        }
    }
}

/// Makes header names unique. Later duplicates of `x` become `x.1`, `x.2`, ...
/// skipping names that already appear in the header; missing names become
/// `Unnamed: <index>`.
pub(crate) fn unique_headers(names: impl IntoIterator<Item = Option<String>>) -> Vec<String> {
    let names: Vec<String> = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| match name {
            Some(name) if !name.trim().is_empty() => name,
            _ => format!("Unnamed: {}", index),
        })
        .collect();
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let mut suffix = 1;
            let mut candidate = format!("{}.{}", name, suffix);
            while taken.contains(&candidate) {
                suffix += 1;
                candidate = format!("{}.{}", name, suffix);
            }
            taken.insert(candidate.clone());
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Loads a table from raw file content.
///
/// # Arguments
///
/// * `bytes` - File content
/// * `filename` - Original file name; its extension selects the parser
/// * `options` - Sheet choice, type handling and size limit
///
/// # Errors
///
/// * `FormatError` for an unsupported extension
/// * `ParseError` for malformed content or a missing header row
/// * `ValidationError` when the input exceeds the size limit
pub fn load(bytes: &[u8], filename: &str, options: &LoadOptions) -> Result<Table, RustyMergeError> {
    let format = FileFormat::detect(filename)?;
    options.check_size(filename, bytes.len())?;
    let (columns, rows) = match format {
        FileFormat::Csv => delimited::read_csv(bytes, options)?,
        FileFormat::Xlsx | FileFormat::Xls => {
            Spreadsheet::open(bytes, format, filename)?.read_sheet(options)?
        }
    };
    let table = Table::new(columns, rows)?;
    info!(
        "Loaded '{}' ({}): {} rows x {} columns",
        filename,
        format,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Loads a table from a file on disk, checking its size before reading it.
pub fn load_path<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Table, RustyMergeError> {
    let path = path.as_ref();
    let filename = path.to_string_lossy();
    FileFormat::detect(&filename)?;
    let size = std::fs::metadata(path)?.len() as usize;
    options.check_size(&filename, size)?;
    let bytes = std::fs::read(path)?;
    load(&bytes, &filename, options)
}

/// Lists the sheet names of a workbook.
pub fn sheet_names(bytes: &[u8], filename: &str) -> Result<Vec<String>, RustyMergeError> {
    let format = FileFormat::detect(filename)?;
    Ok(Spreadsheet::open(bytes, format, filename)?.sheet_names())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::table::Value;

    #[test]
    fn detect_is_case_insensitive() {
        assert_eq!(FileFormat::detect("data.CSV").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::detect("book.Xlsx").unwrap(), FileFormat::Xlsx);
        assert_eq!(FileFormat::detect("old.xls").unwrap(), FileFormat::Xls);
        assert!(FileFormat::detect("notes.txt").is_err());
        assert!(FileFormat::detect("no_extension").is_err());
    }

    #[test]
    fn unsupported_extension_is_a_format_error() {
        let error = load(b"id\n1\n", "data.json", &LoadOptions::default()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Format);
    }

    #[test]
    fn csv_loads_with_header() {
        let table = load(b"id,name\n1,x\n2,\n", "a.csv", &LoadOptions::default()).unwrap();
        assert_eq!(table.columns(), &["id", "name"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, "id"), Some(&Value::from("1")));
        assert_eq!(table.get(1, "name"), Some(&Value::Null));
    }

    #[test]
    fn duplicate_and_empty_headers_are_renamed() {
        let names = unique_headers(
            ["x", "x", "x.1", "", "x"]
                .into_iter()
                .map(|name| Some(name.to_owned())),
        );
        assert_eq!(names, vec!["x", "x.2", "x.1", "Unnamed: 3", "x.3"]);
    }

    #[test]
    fn csv_load_renames_repeated_headers() {
        let table = load(b"x,x,\n1,2,3\n", "a.csv", &LoadOptions::default()).unwrap();
        assert_eq!(table.columns(), &["x", "x.1", "Unnamed: 2"]);
        assert_eq!(table.get(0, "x.1"), Some(&Value::from("2")));
        assert_eq!(table.get(0, "Unnamed: 2"), Some(&Value::from("3")));
    }

    #[test]
    fn size_limit_is_enforced() {
        let options = LoadOptions {
            max_size_bytes: Some(4),
            ..LoadOptions::default()
        };
        let error = load(b"id\n1\n2\n", "a.csv", &options).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn corrupt_workbook_is_a_parse_error() {
        let error = load(b"not a zip", "a.xlsx", &LoadOptions::default()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse);
    }
}
