//! REPL command parsing.

/// Slash commands offered for completion, in help order.
pub const COMMANDS: &[&str] = &[
    "/confirm", "/redo", "/skip", "/exit", "/hint", "/code", "/status", "/help", "/quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free text captured as the answer to the current question.
    Answer(String),
    Confirm,
    Redo,
    Skip,
    Exit,
    Hint,
    Code(String),
    Status,
    Help,
    /// Leave the REPL without a report.
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Self::Answer(line.to_string()));
        }

        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((line, ""));
        let command = match name {
            "/confirm" => Self::Confirm,
            "/redo" => Self::Redo,
            "/skip" => Self::Skip,
            "/exit" => Self::Exit,
            "/hint" => Self::Hint,
            "/code" => Self::Code(rest.to_string()),
            "/status" => Self::Status,
            "/help" => Self::Help,
            "/quit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Parses a comma or space separated list of panel ids.
pub fn parse_panel(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_an_answer() {
        assert_eq!(
            Command::parse("  I led the migration. "),
            Some(Command::Answer("I led the migration.".into()))
        );
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn code_keeps_its_argument() {
        assert_eq!(
            Command::parse("/code fn main() {}"),
            Some(Command::Code("fn main() {}".into()))
        );
        assert_eq!(Command::parse("/code"), Some(Command::Code(String::new())));
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(Command::parse("/plan"), Some(Command::Unknown("/plan".into())));
        assert_eq!(Command::parse("/skip"), Some(Command::Skip));
    }

    #[test]
    fn panel_accepts_commas_and_spaces() {
        assert_eq!(parse_panel("p1, p2 s3,,"), vec!["p1", "p2", "s3"]);
        assert!(parse_panel("").is_empty());
    }
}
