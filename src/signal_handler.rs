use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

const ENTER_NOTICE: &[u8] = b"\nEntering foreground-only mode (& is now ignored)\n";
const EXIT_NOTICE: &[u8] = b"\nExiting foreground-only mode\n";

/// Whether `&` is currently ignored.
pub fn foreground_only() -> bool {
    FOREGROUND_ONLY.load(Ordering::SeqCst)
}

/// Flips foreground-only mode and returns the new value.
fn toggle_foreground_only() -> bool {
    !FOREGROUND_ONLY.fetch_xor(true, Ordering::SeqCst)
}

/// Runs in signal context: no allocation, no locks, one raw write.
extern "C" fn handle_sigtstp(_: libc::c_int) {
    let notice = if toggle_foreground_only() {
        ENTER_NOTICE
    } else {
        EXIT_NOTICE
    };
    unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            notice.as_ptr() as *const libc::c_void,
            notice.len(),
        );
    }
}

fn set_disposition(sig: Signal, handler: SigHandler) -> nix::Result<()> {
    let action = SigAction::new(handler, SaFlags::SA_RESTART, SigSet::all());
    // the only handler we ever install is handle_sigtstp, which is signal safe
    unsafe { signal::sigaction(sig, &action) }.map(drop)
}

/// Shell-side dispositions: SIGINT ignored, SIGTSTP toggles the mode.
pub fn install_shell_handlers() -> nix::Result<()> {
    set_disposition(Signal::SIGINT, SigHandler::SigIgn)?;
    set_disposition(Signal::SIGTSTP, SigHandler::Handler(handle_sigtstp))
}

/// Child-side dispositions, applied between fork and exec.
///
/// SIGPIPE goes back to default and SIGTSTP is always ignored. SIGINT gets
/// `sigint`, which is either the default action or the ignore inherited from
/// the shell.
pub fn install_child_handlers(sigint: SigHandler) -> nix::Result<()> {
    // the Rust runtime ignores SIGPIPE in the shell; exec'd programs expect the default
    set_disposition(Signal::SIGPIPE, SigHandler::SigDfl)?;
    set_disposition(Signal::SIGTSTP, SigHandler::SigIgn)?;
    set_disposition(Signal::SIGINT, sigint)
}

/// Holds SIGTSTP pending while alive.
///
/// The shell keeps one of these around a foreground wait so the mode can't
/// flip under a running command; a pending toggle is delivered on drop.
pub struct DeferSigtstp {
    mask: SigSet,
}

impl DeferSigtstp {
    pub fn new() -> nix::Result<Self> {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGTSTP);
        mask.thread_block()?;
        Ok(DeferSigtstp { mask })
    }
}

impl Drop for DeferSigtstp {
    fn drop(&mut self) {
        let _ = self.mask.thread_unblock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_mode() {
        let before = foreground_only();

        handle_sigtstp(libc::SIGTSTP);
        assert_eq!(foreground_only(), !before);

        handle_sigtstp(libc::SIGTSTP);
        assert_eq!(foreground_only(), before);
    }
}
