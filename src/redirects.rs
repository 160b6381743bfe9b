use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;

use crate::command::Command;
use crate::error::{Direction, Error};

const DEV_NULL: &str = "/dev/null";
const OUTPUT_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    File(String),
    DevNull,
}

impl RedirectTarget {
    fn path(&self) -> &str {
        match self {
            RedirectTarget::File(path) => path,
            RedirectTarget::DevNull => DEV_NULL,
        }
    }
}

/// Where the child's stdin and stdout come from. `None` keeps the shell's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectPlan {
    pub stdin: Option<RedirectTarget>,
    pub stdout: Option<RedirectTarget>,
}

impl RedirectPlan {
    /// Explicit paths win; a real background job gets `/dev/null` for any
    /// stream left unspecified so it can't touch the terminal.
    pub fn for_command(cmd: &Command, background: bool) -> Self {
        let fallback = || background.then_some(RedirectTarget::DevNull);
        RedirectPlan {
            stdin: cmd
                .input_path
                .clone()
                .map(RedirectTarget::File)
                .or_else(fallback),
            stdout: cmd
                .output_path
                .clone()
                .map(RedirectTarget::File)
                .or_else(fallback),
        }
    }

    /// Rewires fds 0 and 1. Only ever called in the forked child.
    pub fn apply(&self) -> Result<(), Error> {
        if let Some(target) = &self.stdin {
            let file = File::open(target.path())
                .map_err(|e| redirect_error(target, Direction::Input, e))?;
            replace_fd(&file, libc::STDIN_FILENO)
                .map_err(|e| redirect_error(target, Direction::Input, e))?;
        }

        if let Some(target) = &self.stdout {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(OUTPUT_MODE)
                .open(target.path())
                .map_err(|e| redirect_error(target, Direction::Output, e))?;
            replace_fd(&file, libc::STDOUT_FILENO)
                .map_err(|e| redirect_error(target, Direction::Output, e))?;
        }

        Ok(())
    }
}

fn redirect_error(target: &RedirectTarget, direction: Direction, source: io::Error) -> Error {
    Error::Redirect {
        path: target.path().to_string(),
        direction,
        source,
    }
}

/// dup2 `file` onto `fd`; the original descriptor closes when `file` drops.
fn replace_fd(file: &File, fd: libc::c_int) -> io::Result<()> {
    if unsafe { libc::dup2(file.as_raw_fd(), fd) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
