//! # Rusty Merge
//!
//! Joins two tabular files (CSV, XLSX or XLS) on one or more key columns and
//! writes the result as a new workbook or CSV file.
//!
//! ## Features
//!
//! - **Multi-format input**: `.csv` (UTF-8 or Windows-1252), `.xlsx` and `.xls`,
//!   with sheet selection for workbooks
//! - **Six join types**: inner, left, right, outer and the two anti joins
//!   (rows of A not in B, rows of B not in A)
//! - **Composite keys**: key columns are paired by position and may have
//!   different names on each side
//! - **Collision handling**: shared non-key columns get the `_A`/`_B` suffixes
//! - **Statistics**: row counts, unique keys and matched/unmatched rows per join
//! - **Data quality**: null summaries, key suggestions, duplicate detection
//!   and pre-join checks
//! - **Export**: deterministic single-sheet `.xlsx` or `.csv`
//! - **Interactive shell**: a seven-step wizard over a terminal prompt
//!
//! ## Example
//!
//! ```no_run
//! use rusty_merge::{join, load, to_xlsx_bytes, JoinMode, JoinSpec, LoadOptions};
//!
//! # fn main() -> Result<(), rusty_merge::RustyMergeError> {
//! let options = LoadOptions::default();
//! let a = load(&std::fs::read("customers.csv")?, "customers.csv", &options)?;
//! let b = load(&std::fs::read("orders.xlsx")?, "orders.xlsx", &options)?;
//! let spec = JoinSpec::new(["id"], ["customer_id"], JoinMode::Left);
//! let result = join(&a, &b, &spec)?;
//! std::fs::write("merged.xlsx", to_xlsx_bytes(&result.table)?)?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod error;
pub mod export;
pub mod join;
pub mod loader;
pub mod quality;
pub mod select;
pub mod session;
pub mod shell;
pub mod table;

pub(crate) mod helpers;

pub use config::{ConfigError, MergeConfig, Settings};
pub use error::{ErrorKind, RustyMergeError};
pub use export::{export, sanitize_filename, to_csv_bytes, to_xlsx_bytes, write_file, ExportFormat};
pub use join::{join, JoinMode, JoinResult, JoinSpec, JoinStats};
pub use loader::{load, load_path, sheet_names, FileFormat, FormatError, LoadOptions, ParseError};
pub use select::{resolve_side_columns, select};
pub use session::{Session, Side, Step};
pub use table::{Table, ValidationError, Value};
