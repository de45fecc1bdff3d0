//! # Merge Session
//!
//! All state of one merge workflow lives in a [`Session`] value that the
//! interactive shell (or any other driver) passes through the seven steps:
//!
//! 1. upload both tables
//! 2. choose key columns per side
//! 3. choose the join type
//! 4. choose output columns per side
//! 5. execute the join
//! 6. review statistics and a preview
//! 7. download the result
//!
//! Each step method validates its inputs and leaves the session unchanged on
//! error, so a failed step can simply be retried.
use crate::config::{ConfigError, MergeConfig, Settings};
use crate::error::RustyMergeError;
use crate::export::{export, write_file, ExportFormat};
use crate::join::{join, JoinMode, JoinResult, JoinSpec, JoinStats};
use crate::loader::{load, load_path, LoadOptions};
use crate::quality::{analyze_data_quality, normalize, validate_before_merge, QualityReport, ValidationReport};
use crate::select::{resolve_side_columns, select};
use crate::table::{Table, ValidationError};
use chrono::{DateTime, Local};
use log::{debug, info};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// One of the two input tables.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }

    /// Name used in error messages, e.g. "table A".
    pub fn table_label(&self) -> String {
        format!("table {}", self.as_str())
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The seven workflow steps, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Upload,
    Keys,
    Mode,
    Columns,
    Execute,
    Statistics,
    Download,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::Upload,
        Step::Keys,
        Step::Mode,
        Step::Columns,
        Step::Execute,
        Step::Statistics,
        Step::Download,
    ];

    /// 1-based position of the step.
    pub fn number(&self) -> usize {
        *self as usize + 1
    }

    pub const fn title(&self) -> &'static str {
        match self {
            Step::Upload => "Upload files",
            Step::Keys => "Choose key columns",
            Step::Mode => "Choose join type",
            Step::Columns => "Choose output columns",
            Step::Execute => "Execute merge",
            Step::Statistics => "Statistics and preview",
            Step::Download => "Download result",
        }
    }

    pub fn next(&self) -> Option<Step> {
        Step::ALL.get(self.number()).copied()
    }

    pub fn previous(&self) -> Option<Step> {
        (*self as usize).checked_sub(1).and_then(|index| Step::ALL.get(index).copied())
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Step {}: {}", self.number(), self.title())
    }
}

/// A loaded input table with its source name and quality summary.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedTable {
    pub name: String,
    pub table: Table,
    pub quality: QualityReport,
}

/// One executed merge.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub mode: JoinMode,
    pub keys_a: Vec<String>,
    pub keys_b: Vec<String>,
    pub rows_result: usize,
}

impl Display for HistoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} on {} = {} -> {} rows",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.mode,
            self.keys_a.join(", "),
            self.keys_b.join(", "),
            self.rows_result
        )
    }
}

/// State of one merge workflow.
#[derive(Debug, Default)]
pub struct Session {
    settings: Settings,
    table_a: Option<LoadedTable>,
    table_b: Option<LoadedTable>,
    keys_a: Vec<String>,
    keys_b: Vec<String>,
    mode: JoinMode,
    columns_a: Vec<String>,
    columns_b: Vec<String>,
    result: Option<JoinResult>,
    history: Vec<HistoryEntry>,
}

fn not_ready(step: Step, reason: &str) -> ValidationError {
    ValidationError::StepNotReady {
        step: step.to_string(),
        reason: reason.to_owned(),
    }
}

impl Session {
    pub fn new(settings: Settings) -> Result<Session, ConfigError> {
        settings.validate()?;
        Ok(Session {
            settings,
            ..Session::default()
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the settings. Tables already loaded are kept as they are.
    pub fn set_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    pub fn table(&self, side: Side) -> Option<&LoadedTable> {
        match side {
            Side::A => self.table_a.as_ref(),
            Side::B => self.table_b.as_ref(),
        }
    }

    fn loaded(&self, side: Side, step: Step) -> Result<&Table, ValidationError> {
        self.table(side)
            .map(|loaded| &loaded.table)
            .ok_or_else(|| not_ready(step, &format!("{} is not loaded", side.table_label())))
    }

    fn load_options(&self, sheet_name: Option<String>) -> LoadOptions {
        LoadOptions {
            sheet_name,
            ..self.settings.load_options()
        }
    }

    /// Stores a freshly loaded table, dropping selections that referred to the old one.
    fn store(&mut self, side: Side, name: &str, table: Table) -> Result<&LoadedTable, RustyMergeError> {
        let table = if self.settings.normalize {
            normalize(&table, &[] as &[&str])?
        } else {
            table
        };
        let quality = analyze_data_quality(&table);
        let loaded = LoadedTable {
            name: name.to_owned(),
            table,
            quality,
        };
        self.result = None;
        let slot = match side {
            Side::A => {
                self.keys_a.clear();
                self.columns_a.clear();
                &mut self.table_a
            }
            Side::B => {
                self.keys_b.clear();
                self.columns_b.clear();
                &mut self.table_b
            }
        };
        info!(
            "Table {} is '{}' ({} rows x {} columns)",
            side,
            name,
            loaded.table.row_count(),
            loaded.table.column_count()
        );
        Ok(&*slot.insert(loaded))
    }

    /// Step 1: loads one side from file content.
    pub fn upload(
        &mut self,
        side: Side,
        bytes: &[u8],
        filename: &str,
        sheet_name: Option<String>,
    ) -> Result<&LoadedTable, RustyMergeError> {
        let table = load(bytes, filename, &self.load_options(sheet_name))?;
        self.store(side, filename, table)
    }

    /// Step 1: loads one side from a file on disk.
    pub fn upload_path<P: AsRef<Path>>(
        &mut self,
        side: Side,
        path: P,
        sheet_name: Option<String>,
    ) -> Result<&LoadedTable, RustyMergeError> {
        let path = path.as_ref();
        let table = load_path(path, &self.load_options(sheet_name))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.store(side, &name, table)
    }

    /// Step 2: sets the key columns of both sides and reports on their quality.
    ///
    /// Fails when a list is empty, the lists differ in length or a key is
    /// missing from its table. Warnings (nulls, repeated keys, no overlap)
    /// are returned in the report and do not block the step.
    pub fn choose_keys<S: AsRef<str>>(&mut self, keys_a: &[S], keys_b: &[S]) -> Result<ValidationReport, RustyMergeError> {
        let a = self.loaded(Side::A, Step::Keys)?;
        let b = self.loaded(Side::B, Step::Keys)?;
        if keys_a.is_empty() {
            Err(ValidationError::EmptyKeys { side: "A".to_owned() })?;
        }
        if keys_b.is_empty() {
            Err(ValidationError::EmptyKeys { side: "B".to_owned() })?;
        }
        if keys_a.len() != keys_b.len() {
            Err(ValidationError::KeyCountMismatch {
                left: keys_a.len(),
                right: keys_b.len(),
            })?;
        }
        for key in keys_a {
            a.require_column(key.as_ref(), "table A")?;
        }
        for key in keys_b {
            b.require_column(key.as_ref(), "table B")?;
        }
        let report = validate_before_merge(a, b, keys_a, keys_b);
        self.keys_a = keys_a.iter().map(|key| key.as_ref().to_owned()).collect();
        self.keys_b = keys_b.iter().map(|key| key.as_ref().to_owned()).collect();
        self.result = None;
        debug!("Keys set: {:?} = {:?}", self.keys_a, self.keys_b);
        Ok(report)
    }

    pub fn keys(&self) -> (&[String], &[String]) {
        (&self.keys_a, &self.keys_b)
    }

    /// Step 3: sets the join type.
    pub fn choose_mode(&mut self, mode: JoinMode) {
        if self.mode != mode {
            self.result = None;
        }
        self.mode = mode;
    }

    pub fn mode(&self) -> JoinMode {
        self.mode
    }

    /// Step 4: picks the output columns from each original table. Empty lists keep every column.
    pub fn choose_columns<S: AsRef<str>>(&mut self, columns_a: &[S], columns_b: &[S]) -> Result<(), ValidationError> {
        let a = self.loaded(Side::A, Step::Columns)?;
        let b = self.loaded(Side::B, Step::Columns)?;
        for column in columns_a {
            a.require_column(column.as_ref(), "table A")?;
        }
        for column in columns_b {
            b.require_column(column.as_ref(), "table B")?;
        }
        self.columns_a = columns_a.iter().map(|column| column.as_ref().to_owned()).collect();
        self.columns_b = columns_b.iter().map(|column| column.as_ref().to_owned()).collect();
        self.result = None;
        Ok(())
    }

    pub fn columns(&self) -> (&[String], &[String]) {
        (&self.columns_a, &self.columns_b)
    }

    /// The join specification built from the current selections.
    pub fn join_spec(&self) -> JoinSpec {
        let (suffix_a, suffix_b) = &self.settings.suffixes;
        JoinSpec::new(self.keys_a.clone(), self.keys_b.clone(), self.mode).with_suffixes(suffix_a, suffix_b)
    }

    /// Step 5: runs the join and narrows it to the chosen columns.
    pub fn execute(&mut self) -> Result<&JoinResult, RustyMergeError> {
        let a = self.loaded(Side::A, Step::Execute)?;
        let b = self.loaded(Side::B, Step::Execute)?;
        if self.keys_a.is_empty() || self.keys_b.is_empty() {
            Err(not_ready(Step::Execute, "key columns are not chosen"))?;
        }
        let spec = self.join_spec();
        let joined = join(a, b, &spec)?;
        let (suffix_a, suffix_b) = &spec.suffixes;
        let columns = resolve_side_columns(
            &joined.table,
            &self.columns_a,
            &self.columns_b,
            (suffix_a.as_str(), suffix_b.as_str()),
        );
        let table = select(&joined.table, &columns)?;
        let stats = JoinStats {
            rows_result: table.row_count(),
            ..joined.stats
        };
        self.history.push(HistoryEntry {
            timestamp: Local::now(),
            mode: spec.mode,
            keys_a: spec.keys_a.clone(),
            keys_b: spec.keys_b.clone(),
            rows_result: stats.rows_result,
        });
        Ok(&*self.result.insert(JoinResult { table, stats }))
    }

    pub fn result(&self) -> Option<&JoinResult> {
        self.result.as_ref()
    }

    fn executed(&self, step: Step) -> Result<&JoinResult, ValidationError> {
        self.result
            .as_ref()
            .ok_or_else(|| not_ready(step, "the merge has not been executed"))
    }

    /// Step 6: statistics of the last execution.
    pub fn statistics(&self) -> Result<&JoinStats, ValidationError> {
        self.executed(Step::Statistics).map(|result| &result.stats)
    }

    /// Step 6: the first `limit` result rows, optionally only rows whose text contains `search`.
    pub fn preview(&self, limit: usize, search: Option<&str>) -> Result<Table, ValidationError> {
        let result = self.executed(Step::Statistics)?;
        let table = match search.map(str::trim).filter(|term| !term.is_empty()) {
            Some(term) => result.table.search(term).head(limit),
            None => result.table.head(limit),
        };
        Ok(table)
    }

    /// Step 7: the result serialized in the given format.
    pub fn download(&self, format: ExportFormat) -> Result<Vec<u8>, RustyMergeError> {
        let result = self.executed(Step::Download)?;
        export(&result.table, format)
    }

    /// Step 7: writes the result to disk, choosing the format from the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, RustyMergeError> {
        let result = self.executed(Step::Download)?;
        write_file(&result.table, path)
    }

    /// Merges executed in this session, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The current keys, join type and suffixes as a saveable configuration.
    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig::from(&self.join_spec())
    }

    /// Applies a saved configuration. Keys are checked against the loaded
    /// tables when both are present.
    pub fn apply_config(&mut self, config: &MergeConfig) -> Result<Option<ValidationReport>, RustyMergeError> {
        let spec = config.to_spec()?;
        let settings = Settings {
            suffixes: spec.suffixes.clone(),
            ..self.settings.clone()
        };
        settings.validate()?;
        let report = if self.table_a.is_some() && self.table_b.is_some() {
            Some(self.choose_keys(&spec.keys_a, &spec.keys_b)?)
        } else {
            self.keys_a = spec.keys_a;
            self.keys_b = spec.keys_b;
            None
        };
        self.settings = settings;
        self.choose_mode(spec.mode);
        self.result = None;
        Ok(report)
    }
}
