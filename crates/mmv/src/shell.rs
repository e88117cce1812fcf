//! Commands accepted by the interactive session.

/// A parsed session command. Indexes are zero-based.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ShellCommand {
    /// Blank line.
    Nothing,
    Index,
    Open(usize),
    Links,
    Follow(usize),
    Toc,
    /// Search; an empty query clears highlights.
    Search(String),
    /// Report the viewport top, in lines.
    Scroll(f64),
    Home,
    Theme,
    Menu,
    Close,
    Help,
    Quit,
}

/// Error parsing a session command.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum CommandError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),

    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("`{0}` is not a valid number")]
    InvalidNumber(String),
}

pub(crate) const HELP: &str = "\
index          list manuals
open N         open manual N
links          list links in the current manual
follow N       follow link N
toc            show the table of contents
search TEXT    highlight TEXT (no TEXT clears)
scroll LINE    scroll to LINE and show the section in view
home           open the first manual
theme          toggle dark/light theme
menu           toggle the navigation drawer
close          close the navigation drawer (Escape)
help           show this help
quit           leave";

impl ShellCommand {
    pub(crate) fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "" => Self::Nothing,
            "index" | "ls" => Self::Index,
            "open" | "o" => Self::Open(position("open", rest)?),
            "links" => Self::Links,
            "follow" | "f" => Self::Follow(position("follow", rest)?),
            "toc" => Self::Toc,
            "search" | "/" => Self::Search(rest.to_owned()),
            "scroll" => Self::Scroll(line_number(rest)?),
            "home" => Self::Home,
            "theme" => Self::Theme,
            "menu" => Self::Menu,
            "close" | "esc" => Self::Close,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => return Err(CommandError::Unknown(name.to_owned())),
        };
        Ok(command)
    }
}

/// One-based position to zero-based index.
fn position(command: &'static str, arg: &str) -> Result<usize, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            what: "a number",
        });
    }
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::InvalidNumber(arg.to_owned())),
    }
}

fn line_number(arg: &str) -> Result<f64, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument {
            command: "scroll",
            what: "a line number",
        });
    }
    arg.parse::<u32>()
        .map(f64::from)
        .map_err(|_| CommandError::InvalidNumber(arg.to_owned()))
}
