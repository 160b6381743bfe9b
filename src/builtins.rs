use std::env;
use std::io::{self, Write};

use crate::command::Command;
use crate::error::Error;
use crate::status::StatusRegister;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Cd,
    Status,
}

/// What the loop should do after a built-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "exit" => Some(Builtin::Exit),
            "cd" => Some(Builtin::Cd),
            "status" => Some(Builtin::Status),
            _ => None,
        }
    }

    /// Runs in the shell's own process. Redirections and `&` on the line are
    /// ignored.
    pub fn run(
        self,
        cmd: &Command,
        status: &StatusRegister,
        out: &mut impl Write,
    ) -> Result<Flow, Error> {
        match self {
            Builtin::Exit => Ok(Flow::Exit),
            Builtin::Cd => {
                change_dir(cmd.args().first().map(String::as_str))?;
                Ok(Flow::Continue)
            }
            Builtin::Status => {
                writeln!(out, "{}", status.current())
                    .and_then(|()| out.flush())
                    .map_err(|e| builtin_error("status", e))?;
                Ok(Flow::Continue)
            }
        }
    }
}

fn change_dir(target: Option<&str>) -> Result<(), Error> {
    let home;
    let target = match target {
        Some(path) => path,
        None => {
            home = env::var("HOME").map_err(|_| Error::Builtin {
                name: "cd",
                message: "HOME not set".to_string(),
            })?;
            &home
        }
    };

    env::set_current_dir(target).map_err(|e| Error::Builtin {
        name: "cd",
        message: format!("{target}: {}", describe(&e)),
    })
}

fn builtin_error(name: &'static str, e: io::Error) -> Error {
    Error::Builtin {
        name,
        message: describe(&e),
    }
}

/// The OS message without the "(os error N)" suffix.
fn describe(e: &io::Error) -> String {
    match e.raw_os_error() {
        Some(code) => nix::errno::Errno::from_raw(code).desc().to_string(),
        None => e.to_string(),
    }
}
