use crate::table::ValidationError;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

// ANSI escape codes for styling
pub(crate) const BOLD_ORANGE: &str = "\x1b[1;38;5;208m";
pub(crate) const YELLOW: &str = "\x1b[0;93m";
pub(crate) const RED: &str = "\x1b[1;31m";
pub(crate) const GREEN: &str = "\x1b[0;32m";
pub(crate) const RESET: &str = "\x1b[0m";

/// What the user typed at a prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Answer {
    Line(String),
    /// "back" or "b": return to the previous step
    Back,
    /// "quit", "q", Ctrl-C or Ctrl-D
    Quit,
}

/// Line editor with history, styled like the rest of the shell.
pub(crate) struct Prompt {
    editor: DefaultEditor,
}

impl Prompt {
    pub(crate) fn new() -> Result<Prompt, ReadlineError> {
        Ok(Prompt {
            editor: DefaultEditor::new()?,
        })
    }

    /// Reads one trimmed line.
    pub(crate) fn ask(&mut self, prompt: &str) -> Answer {
        let styled = format!("{}@merge: {}{} ", BOLD_ORANGE, prompt, RESET);
        match self.editor.readline(&styled) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                classify(&line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Answer::Quit,
            Err(error) => {
                log::warn!("Error reading line: {}", error);
                Answer::Quit
            }
        }
    }

    /// Reads one line, returning `default` when the user just presses Enter.
    pub(crate) fn ask_or(&mut self, prompt: &str, default: &str) -> Answer {
        match self.ask(&format!("{} [{}]", prompt, default)) {
            Answer::Line(line) if line.is_empty() => Answer::Line(default.to_owned()),
            answer => answer,
        }
    }

    /// Asks a yes/no question; anything but "y"/"yes" is no.
    pub(crate) fn confirm(&mut self, prompt: &str) -> Answer {
        match self.ask(&format!("{} (y/N)", prompt)) {
            Answer::Line(line) => {
                let yes = matches!(line.to_ascii_lowercase().as_str(), "y" | "yes");
                Answer::Line(if yes { "y" } else { "n" }.to_owned())
            }
            answer => answer,
        }
    }
}

fn classify(line: &str) -> Answer {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "back" | "b" => Answer::Back,
        "quit" | "q" | "exit" => Answer::Quit,
        _ => Answer::Line(line.to_owned()),
    }
}

/// Resolves a comma-separated answer against a list of options. Each item
/// is either a 1-based option number or an exact option name; `*` selects
/// every option and an empty answer selects none.
pub(crate) fn parse_selection(answer: &str, options: &[String], table: &str) -> Result<Vec<String>, ValidationError> {
    let answer = answer.trim();
    if answer == "*" {
        return Ok(options.to_vec());
    }
    let mut selected: Vec<String> = Vec::new();
    for item in answer.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let option = match item.parse::<usize>() {
            Ok(number) if (1..=options.len()).contains(&number) && !options.iter().any(|option| option == item) => {
                options[number - 1].to_owned()
            }
            _ => options
                .iter()
                .find(|option| option.as_str() == item)
                .cloned()
                .ok_or_else(|| ValidationError::MissingColumn {
                    column: item.to_owned(),
                    table: table.to_owned(),
                })?,
        };
        if !selected.contains(&option) {
            selected.push(option);
        }
    }
    Ok(selected)
}

/// Formats options as a numbered list.
pub(crate) fn numbered(options: &[String]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(index, option)| format!("  {:>3}. {}", index + 1, option))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["id".to_owned(), "name".to_owned(), "2024".to_owned()]
    }

    #[test]
    fn selection_by_number_and_name() {
        let selected = parse_selection("2, id,2", &options(), "table A").unwrap();
        assert_eq!(selected, vec!["name", "id"]);
        assert_eq!(parse_selection("*", &options(), "table A").unwrap(), options());
        assert!(parse_selection("  ", &options(), "table A").unwrap().is_empty());
    }

    #[test]
    fn numeric_column_names_win_over_positions() {
        let mut options = options();
        options.push("1".to_owned());
        assert_eq!(parse_selection("1", &options, "table A").unwrap(), vec!["1"]);
    }

    #[test]
    fn unknown_selection_names_the_item() {
        let error = parse_selection("id, nope", &options(), "table B").unwrap_err();
        assert_eq!(
            error,
            ValidationError::MissingColumn {
                column: "nope".to_owned(),
                table: "table B".to_owned()
            }
        );
        assert!(parse_selection("9", &options(), "table B").is_err());
    }

    #[test]
    fn answers_are_classified() {
        assert_eq!(classify(" B "), Answer::Back);
        assert_eq!(classify("quit"), Answer::Quit);
        assert_eq!(classify(" id "), Answer::Line("id".to_owned()));
    }
}
