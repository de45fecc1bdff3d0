//! # Interactive Shell
//!
//! Walks a [`Session`] through the seven merge steps from a terminal. Each
//! step reads its answers with a line editor; `back` returns to the
//! previous step and `quit` (or Ctrl-C/Ctrl-D) leaves. A step that fails
//! prints the error with its category and is asked again.
use crate::config::MergeConfig;
use crate::error::RustyMergeError;
use crate::export::{sanitize_filename, ExportFormat};
use crate::join::JoinMode;
use crate::loader::{sheet_names, FileFormat};
use crate::quality::detect_key_columns;
use crate::session::{Session, Side, Step};
use log::debug;
use std::path::Path;

mod prompt;
mod render;

use prompt::{numbered, parse_selection, Answer, Prompt, BOLD_ORANGE, GREEN, RED, RESET};
use render::{render_quality, render_table, render_validation};

/// Rows shown in table previews.
const PREVIEW_ROWS: usize = 10;

/// Where the wizard goes after a step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Flow {
    Next,
    Back,
    /// Return to key selection with the loaded tables
    Restart,
    Repeat,
    Quit,
}

/// Unwraps a line answer, or leaves the step on back/quit.
macro_rules! answer {
    ($answer:expr) => {
        match $answer {
            Answer::Line(line) => line,
            Answer::Back => return Ok(Flow::Back),
            Answer::Quit => return Ok(Flow::Quit),
        }
    };
}

/// Runs the wizard until the user quits or downloads a result and leaves.
pub fn run(mut session: Session) -> anyhow::Result<()> {
    let mut prompt = Prompt::new()?;
    println!(
        "{}Rusty Merge{}: join two CSV or Excel tables. Type 'back' for the previous step, 'quit' to leave.",
        BOLD_ORANGE, RESET
    );
    let mut step = Step::Upload;
    loop {
        println!("\n{}{}{}", BOLD_ORANGE, step, RESET);
        let outcome = match step {
            Step::Upload => upload_step(&mut prompt, &mut session),
            Step::Keys => keys_step(&mut prompt, &mut session),
            Step::Mode => mode_step(&mut prompt, &mut session),
            Step::Columns => columns_step(&mut prompt, &mut session),
            Step::Execute => execute_step(&mut prompt, &mut session),
            Step::Statistics => statistics_step(&mut prompt, &session),
            Step::Download => download_step(&mut prompt, &session),
        };
        match outcome {
            Ok(Flow::Next) => match step.next() {
                Some(next) => step = next,
                None => break,
            },
            Ok(Flow::Back) => step = step.previous().unwrap_or(step),
            Ok(Flow::Restart) => step = Step::Keys,
            Ok(Flow::Repeat) => {}
            Ok(Flow::Quit) => break,
            Err(error) => {
                debug!("{} failed: {:?}", step, error);
                println!("{}{}:{} {}", RED, error.kind(), RESET, error);
            }
        }
    }
    print_history(&session);
    Ok(())
}

fn print_history(session: &Session) {
    if session.history().is_empty() {
        return;
    }
    println!("\nMerges in this session:");
    for entry in session.history() {
        println!("  {}", entry);
    }
}

/// Reads one file for a side, asking for a sheet when a workbook has several.
fn upload_side(prompt: &mut Prompt, session: &mut Session, side: Side) -> Result<Flow, RustyMergeError> {
    let current = session.table(side).map(|loaded| loaded.name.to_owned());
    let question = match &current {
        Some(name) => format!("File for table {} (Enter keeps '{}')", side, name),
        None => format!("File for table {} (.csv, .xlsx, .xls)", side),
    };
    let path = answer!(prompt.ask(&question));
    if path.is_empty() {
        return Ok(if current.is_some() { Flow::Next } else { Flow::Repeat });
    }

    let filename = Path::new(&path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_owned());
    let format = FileFormat::detect(&filename)?;
    let options = session.settings().load_options();
    options.check_size(&filename, std::fs::metadata(&path)?.len() as usize)?;
    let bytes = std::fs::read(&path)?;

    let sheet = if format == FileFormat::Csv {
        None
    } else {
        let sheets = sheet_names(&bytes, &filename)?;
        if sheets.len() > 1 {
            println!("{}", numbered(&sheets));
            let choice = answer!(prompt.ask_or("Sheet", "1"));
            parse_selection(&choice, &sheets, &filename)?.into_iter().next()
        } else {
            None
        }
    };

    let loaded = session.upload(side, &bytes, &filename, sheet)?;
    println!("{}Loaded '{}'{}", GREEN, loaded.name, RESET);
    println!("{}", render_quality(&loaded.quality));
    println!("{}", render_table(&loaded.table.head(PREVIEW_ROWS)));
    let suggested = detect_key_columns(&loaded.table);
    if !suggested.is_empty() {
        println!("Possible key columns: {}", suggested.join(", "));
    }
    Ok(Flow::Next)
}

fn upload_step(prompt: &mut Prompt, session: &mut Session) -> Result<Flow, RustyMergeError> {
    for side in [Side::A, Side::B] {
        loop {
            match upload_side(prompt, session, side)? {
                Flow::Next => break,
                Flow::Repeat => continue,
                flow => return Ok(flow),
            }
        }
    }
    Ok(Flow::Next)
}

fn keys_step(prompt: &mut Prompt, session: &mut Session) -> Result<Flow, RustyMergeError> {
    let (columns_a, columns_b) = match (session.table(Side::A), session.table(Side::B)) {
        (Some(a), Some(b)) => (a.table.columns().to_vec(), b.table.columns().to_vec()),
        _ => return Ok(Flow::Back),
    };
    println!("Columns of table A:\n{}", numbered(&columns_a));
    println!("Columns of table B:\n{}", numbered(&columns_b));
    println!("Pair keys by position, e.g. A 'id, region' with B 'customer_id, region'.");

    let line = answer!(prompt.ask("Keys of table A (comma-separated, or 'load <config.json>')"));
    if let Some(path) = line.strip_prefix("load ") {
        let config = MergeConfig::load(path.trim())?;
        if let Some(report) = session.apply_config(&config)? {
            println!("{}", render_validation(&report));
        }
        let (keys_a, keys_b) = session.keys();
        println!(
            "Using {} = {} with a {} join",
            keys_a.join(", "),
            keys_b.join(", "),
            session.mode()
        );
        return Ok(Flow::Next);
    }
    let keys_a = parse_selection(&line, &columns_a, "table A")?;

    let default_b = keys_a.join(", ");
    let line = answer!(prompt.ask_or("Keys of table B", &default_b));
    let keys_b = parse_selection(&line, &columns_b, "table B")?;

    let report = session.choose_keys(&keys_a, &keys_b)?;
    println!("{}", render_validation(&report));
    Ok(Flow::Next)
}

fn mode_step(prompt: &mut Prompt, session: &mut Session) -> Result<Flow, RustyMergeError> {
    for (index, mode) in JoinMode::ALL.iter().enumerate() {
        println!("  {:>3}. {:<14} {}", index + 1, mode.as_str(), mode.describe());
    }
    let line = answer!(prompt.ask_or("Join type", session.mode().as_str()));
    let mode = match line.parse::<usize>() {
        Ok(number) if (1..=JoinMode::ALL.len()).contains(&number) => JoinMode::ALL[number - 1],
        _ => line.parse::<JoinMode>()?,
    };
    session.choose_mode(mode);
    Ok(Flow::Next)
}

fn columns_step(prompt: &mut Prompt, session: &mut Session) -> Result<Flow, RustyMergeError> {
    let (columns_a, columns_b) = match (session.table(Side::A), session.table(Side::B)) {
        (Some(a), Some(b)) => (a.table.columns().to_vec(), b.table.columns().to_vec()),
        _ => return Ok(Flow::Back),
    };
    if session.mode().is_anti() {
        println!("Anti joins only keep the columns of the driving table.");
    }
    println!("Columns of table A:\n{}", numbered(&columns_a));
    let line = answer!(prompt.ask("Output columns of A (Enter keeps all)"));
    let selected_a = parse_selection(&line, &columns_a, "table A")?;
    println!("Columns of table B:\n{}", numbered(&columns_b));
    let line = answer!(prompt.ask("Output columns of B (Enter keeps all)"));
    let selected_b = parse_selection(&line, &columns_b, "table B")?;
    session.choose_columns(&selected_a, &selected_b)?;
    Ok(Flow::Next)
}

fn execute_step(prompt: &mut Prompt, session: &mut Session) -> Result<Flow, RustyMergeError> {
    let spec = session.join_spec();
    println!(
        "{} join on {} = {}",
        spec.mode,
        spec.keys_a.join(", "),
        spec.keys_b.join(", ")
    );
    answer!(prompt.ask("Press Enter to run the merge"));
    let result = session.execute()?;
    println!(
        "{}Merged into {} rows x {} columns{}",
        GREEN,
        result.table.row_count(),
        result.table.column_count(),
        RESET
    );

    let path = answer!(prompt.ask("Save this configuration to (Enter skips)"));
    if !path.is_empty() {
        session.merge_config().save(&path)?;
        println!("Configuration saved to '{}'", path);
    }
    Ok(Flow::Next)
}

fn statistics_step(prompt: &mut Prompt, session: &Session) -> Result<Flow, RustyMergeError> {
    println!("{}", session.statistics()?);
    println!("{}", render_table(&session.preview(PREVIEW_ROWS, None)?));
    loop {
        let term = answer!(prompt.ask("Search the result (Enter continues)"));
        if term.is_empty() {
            return Ok(Flow::Next);
        }
        let found = session.preview(PREVIEW_ROWS, Some(&term))?;
        if found.is_empty() {
            println!("No row contains '{}'", term);
        } else {
            println!("{}", render_table(&found));
        }
    }
}

fn download_step(prompt: &mut Prompt, session: &Session) -> Result<Flow, RustyMergeError> {
    let default = ExportFormat::default().default_filename();
    let line = answer!(prompt.ask_or("Output file (.xlsx or .csv)", &default));
    let path = Path::new(&line);
    let filename = path
        .file_name()
        .map(|name| sanitize_filename(&name.to_string_lossy()))
        .unwrap_or_else(|| default.to_owned());
    let target = path.with_file_name(filename);
    let written = session.save(&target)?;
    println!("{}Saved '{}'{}", GREEN, written.display(), RESET);

    let again = answer!(prompt.confirm("Adjust and merge again?"));
    Ok(if again == "y" { Flow::Restart } else { Flow::Next })
}
