use std::fmt;
use std::io::{self, StdinLock, Stdout, Write};

use crate::builtins::{Builtin, Flow};
use crate::command::Command;
use crate::error::Error;
use crate::input::LineReader;
use crate::jobs::JobTracker;
use crate::launch::{launch, Launched};
use crate::logger::{dev_debug, user_error, user_warn};
use crate::signal_handler;
use crate::status::{StatusRegister, TerminationResult};

pub struct Shell {
    reader: LineReader<StdinLock<'static>, Stdout>,
    job_tracker: JobTracker,
    status: StatusRegister,
    pid: u32,
    running: bool,
    exit_code: i32,
}

impl Shell {
    pub fn new() -> Self {
        if let Err(e) = signal_handler::install_shell_handlers() {
            user_warn!("cannot install signal handlers: {}", e.desc());
        }

        Self {
            reader: LineReader::new(io::stdin().lock(), io::stdout()),
            job_tracker: JobTracker::new(),
            status: StatusRegister::new(),
            pid: std::process::id(),
            running: true,
            exit_code: 0,
        }
    }

    /// Prompts until `exit` or end of input. Returns the process exit code.
    pub fn run(&mut self) -> i32 {
        while self.running {
            match self.reader.read_line() {
                Ok(Some(line)) => self.execute_line(&line),
                Ok(None) => {
                    dev_debug!("end of input");
                    self.running = false;
                }
                Err(e) => {
                    user_error!("cannot read input: {e}");
                    self.running = false;
                    self.exit_code = 1;
                }
            }

            // completions only ever show up here, between a command and the next prompt
            if let Err(e) = self.job_tracker.sweep(&mut io::stdout()) {
                dev_debug!("cannot report background jobs: {e}");
            }
        }

        if self.job_tracker.len() > 0 {
            dev_debug!(
                "leaving {} background job(s) running",
                self.job_tracker.len()
            );
        }
        self.exit_code
    }

    fn execute_line(&mut self, line: &str) {
        let cmd = match Command::parse(line, self.pid) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return,
            Err(e) => {
                user_error!("{}", Error::from(e));
                return;
            }
        };

        if let Some(builtin) = Builtin::lookup(cmd.program()) {
            match builtin.run(&cmd, &self.status, &mut io::stdout()) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => self.running = false,
                Err(e) => user_error!("{e}"),
            }
            return;
        }

        match launch(&cmd, signal_handler::foreground_only()) {
            Ok(Launched::Background(pid)) => {
                self.job_tracker.add_job(pid);
                announce(format_args!("background pid is {pid}"));
            }
            Ok(Launched::Foreground(result)) => {
                self.status.record(result);
                if let TerminationResult::Signaled(_) = result {
                    announce(format_args!("{result}"));
                }
            }
            Err(e) => user_error!("{e}"),
        }
    }
}

fn announce(message: fmt::Arguments) {
    let mut stdout = io::stdout();
    if let Err(e) = writeln!(stdout, "{message}").and_then(|()| stdout.flush()) {
        dev_debug!("cannot write to stdout: {e}");
    }
}
