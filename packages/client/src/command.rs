//! Parsing of input lines into client commands.

use thiserror::Error;

/// A line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Signup { user: String, password: String },
    Login { user: String, password: String },
    Logout,
    /// Replace the whole document
    Edit(String),
    /// Add a line at the end of the document
    Append(String),
    Save,
    New,
    Show,
    Help,
    Quit,
    Chat(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown command '{0}' (try /help)")]
    Unknown(String),
}

/// Parse one input line
///
/// Lines starting with `/` are commands; anything else is chat.
/// In `/edit` and `/append`, a literal `\n` is turned into a newline.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Chat(line.to_string()));
    };

    let (name, argument) = match rest.split_once(' ') {
        Some((name, argument)) => (name, argument),
        None => (rest, ""),
    };

    match name {
        "signup" => credentials(argument, "/signup <user> <password>")
            .map(|(user, password)| Command::Signup { user, password }),
        "login" => credentials(argument, "/login <user> <password>")
            .map(|(user, password)| Command::Login { user, password }),
        "logout" => Ok(Command::Logout),
        "edit" => Ok(Command::Edit(unescape(argument))),
        "append" => Ok(Command::Append(unescape(argument))),
        "save" => Ok(Command::Save),
        "new" => Ok(Command::New),
        "show" => Ok(Command::Show),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(format!("/{}", other))),
    }
}

fn credentials(argument: &str, usage: &'static str) -> Result<(String, String), CommandError> {
    let mut parts = argument.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(user), Some(password), None) => Ok((user.to_string(), password.to_string())),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
}
