use std::{fmt, io};

use nix::errno::Errno;

use crate::command::{MAX_ARGS, MAX_LINE_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MissingRedirectTarget(&'static str),
    LineTooLong(usize),
    TooManyArguments(usize),
    MissingCommand,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRedirectTarget(op) => write!(f, "expected filename after '{op}'"),
            ParseError::LineTooLong(len) => write!(
                f,
                "line too long ({len} bytes, limit is {MAX_LINE_LENGTH})"
            ),
            ParseError::TooManyArguments(count) => write!(
                f,
                "too many arguments ({count}, limit is {MAX_ARGS})"
            ),
            ParseError::MissingCommand => f.write_str("missing command"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Redirect {
        path: String,
        direction: Direction,
        source: io::Error,
    },
    Launch(String),
    Exec {
        program: String,
        source: Errno,
    },
    Builtin {
        name: &'static str,
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "syntax error: {e}"),
            Error::Redirect {
                path, direction, ..
            } => write!(f, "cannot open {path} for {direction}"),
            Error::Launch(e) => write!(f, "cannot start command: {e}"),
            Error::Exec { program, source } => write!(f, "{program}: {}", source.desc()),
            Error::Builtin { name, message } => write!(f, "{name}: {message}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Redirect { source, .. } => Some(source),
            Error::Exec { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<Errno> for Error {
    fn from(e: Errno) -> Self {
        Error::Launch(e.desc().to_string())
    }
}
