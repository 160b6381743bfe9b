use std::ffi::CString;
use std::io::{self, Write};

use nix::errno::Errno;
use nix::sys::signal::SigHandler;
use nix::sys::wait::waitpid;
use nix::unistd::{execvp, fork, ForkResult, Pid};

use crate::command::Command;
use crate::error::Error;
use crate::logger::{dev_debug, user_error, user_warn};
use crate::redirects::RedirectPlan;
use crate::signal_handler::{self, DeferSigtstp};
use crate::status::TerminationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigintAction {
    /// Ctrl-C kills the child.
    Default,
    /// Keep the ignore inherited from the shell.
    Ignore,
}

impl SigintAction {
    fn handler(self) -> SigHandler {
        match self {
            SigintAction::Default => SigHandler::SigDfl,
            SigintAction::Ignore => SigHandler::SigIgn,
        }
    }
}

/// Everything the child needs, worked out before forking.
#[derive(Debug)]
pub struct LaunchPlan {
    pub program: String,
    pub argv: Vec<CString>,
    pub background: bool,
    pub sigint: SigintAction,
    pub redirects: RedirectPlan,
}

impl LaunchPlan {
    pub fn new(cmd: &Command, foreground_only: bool) -> Result<Self, Error> {
        let argv = cmd
            .argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                Error::Launch(format!("{}: argument contains a NUL byte", cmd.program()))
            })?;

        let background = cmd.background && !foreground_only;
        let sigint = if background {
            SigintAction::Ignore
        } else {
            SigintAction::Default
        };

        Ok(LaunchPlan {
            program: cmd.program().to_string(),
            argv,
            background,
            sigint,
            redirects: RedirectPlan::for_command(cmd, background),
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Launched {
    Background(Pid),
    Foreground(TerminationResult),
}

/// Forks and execs `cmd`.
///
/// Background children are returned right away; foreground children are
/// waited for with SIGTSTP held pending.
pub fn launch(cmd: &Command, foreground_only: bool) -> Result<Launched, Error> {
    let plan = LaunchPlan::new(cmd, foreground_only)?;

    // anything still buffered would otherwise be written by both processes
    if let Err(e) = io::stdout().flush().and_then(|()| io::stderr().flush()) {
        dev_debug!("cannot flush output before fork: {e}");
    }

    match unsafe { fork() }? {
        ForkResult::Child => exec_child(&plan),
        ForkResult::Parent { child } => {
            dev_debug!(
                "forked {child} for {} ({})",
                plan.program,
                if plan.background { "background" } else { "foreground" }
            );
            if plan.background {
                Ok(Launched::Background(child))
            } else {
                wait_foreground(child).map(Launched::Foreground)
            }
        }
    }
}

fn wait_foreground(child: Pid) -> Result<TerminationResult, Error> {
    let _deferred = match DeferSigtstp::new() {
        Ok(guard) => Some(guard),
        Err(e) => {
            user_warn!("cannot defer SIGTSTP: {}", e.desc());
            None
        }
    };

    loop {
        match waitpid(child, None) {
            Ok(status) => {
                if let Some(result) = TerminationResult::from_wait_status(status) {
                    dev_debug!("foreground {child} finished: {result}");
                    return Ok(result);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => {
                return Err(Error::Launch(format!("waiting for {child}: {}", e.desc())));
            }
        }
    }
}

/// Child side of the fork. Never returns.
fn exec_child(plan: &LaunchPlan) -> ! {
    if let Err(e) = signal_handler::install_child_handlers(plan.sigint.handler()) {
        user_error!("{}: cannot set signal handlers: {}", plan.program, e.desc());
        exit_child(1);
    }

    if let Err(e) = plan.redirects.apply() {
        user_error!("{e}");
        exit_child(1);
    }

    let Err(source) = execvp(&plan.argv[0], &plan.argv);
    let e = Error::Exec {
        program: plan.program.clone(),
        source,
    };
    user_error!("{e}");
    exit_child(1)
}

/// Leaves without running atexit hooks or flushing the parent's buffers.
fn exit_child(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirects::RedirectTarget;
    use pretty_assertions::assert_eq;

    fn command(line: &str) -> Command {
        Command::parse(line, 1).unwrap().unwrap()
    }

    #[test]
    fn test_foreground_plan() {
        let plan = LaunchPlan::new(&command("ls -l"), false).unwrap();
        assert_eq!(plan.program, "ls");
        assert_eq!(
            plan.argv,
            vec![CString::new("ls").unwrap(), CString::new("-l").unwrap()]
        );
        assert!(!plan.background);
        assert_eq!(plan.sigint, SigintAction::Default);
        assert_eq!(plan.redirects, RedirectPlan::default());
    }

    #[test]
    fn test_background_plan() {
        let plan = LaunchPlan::new(&command("sleep 5 > log.txt &"), false).unwrap();
        assert!(plan.background);
        assert_eq!(plan.sigint, SigintAction::Ignore);
        assert_eq!(plan.redirects.stdin, Some(RedirectTarget::DevNull));
        assert_eq!(
            plan.redirects.stdout,
            Some(RedirectTarget::File("log.txt".into()))
        );
    }

    #[test]
    fn test_foreground_only_mode_ignores_ampersand() {
        let plan = LaunchPlan::new(&command("sleep 5 &"), true).unwrap();
        assert!(!plan.background);
        assert_eq!(plan.sigint, SigintAction::Default);
        assert_eq!(plan.redirects, RedirectPlan::default());
    }

    #[test]
    fn test_nul_byte_is_a_launch_error() {
        let cmd = Command {
            argv: vec!["echo".into(), "a\0b".into()],
            input_path: None,
            output_path: None,
            background: false,
        };
        match LaunchPlan::new(&cmd, false) {
            Err(Error::Launch(message)) => assert!(message.contains("NUL")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
