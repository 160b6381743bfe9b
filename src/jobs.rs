use std::collections::HashMap;
use std::io::{self, Write};

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::Pid;

use crate::logger::{dev_debug, dev_trace, user_error};
use crate::status::TerminationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedJob {
    pub pid: Pid,
}

pub struct JobTracker {
    jobs: HashMap<Pid, TrackedJob>,
}

impl JobTracker {
    pub fn new() -> Self {
        JobTracker {
            jobs: HashMap::new(),
        }
    }

    pub fn add_job(&mut self, pid: Pid) {
        self.jobs.insert(pid, TrackedJob { pid });
        dev_debug!("tracking background pid {pid} ({} outstanding)", self.jobs.len());
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Reaps every child that has already terminated and reports the tracked
    /// ones to `out`. Never blocks.
    pub fn sweep(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.sweep_with(reap_any, out)
    }

    /// Same as [`sweep`](Self::sweep), with the reaping step supplied by the
    /// caller. `reap` returns `Ok(None)` when nothing more is ready.
    pub fn sweep_with<F>(&mut self, mut reap: F, out: &mut impl Write) -> io::Result<()>
    where
        F: FnMut() -> nix::Result<Option<(Pid, TerminationResult)>>,
    {
        loop {
            match reap() {
                Ok(Some((pid, result))) => {
                    if let Some(job) = self.jobs.remove(&pid) {
                        writeln!(out, "background pid {} is done: {result}", job.pid)?;
                    } else {
                        dev_trace!("reaped untracked pid {pid}: {result}");
                    }
                }
                Ok(None) | Err(Errno::ECHILD) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    user_error!("error checking background jobs: {}", e.desc());
                    break;
                }
            }
        }
        out.flush()
    }
}

/// One non-blocking `waitpid(-1)`.
fn reap_any() -> nix::Result<Option<(Pid, TerminationResult)>> {
    loop {
        let status = waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG))?;
        let Some(pid) = status.pid() else {
            return Ok(None);
        };
        if let Some(result) = TerminationResult::from_wait_status(status) {
            return Ok(Some((pid, result)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    type Reaped = nix::Result<Option<(Pid, TerminationResult)>>;

    fn sweep(tracker: &mut JobTracker, events: Vec<Reaped>) -> String {
        let mut events: VecDeque<Reaped> = events.into();
        let mut out = Vec::new();
        tracker
            .sweep_with(|| events.pop_front().unwrap_or(Ok(None)), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn test_nothing_ready_is_quiet() {
        let mut tracker = JobTracker::new();
        tracker.add_job(pid(10));
        assert_eq!(sweep(&mut tracker, vec![]), "");
        assert_eq!(sweep(&mut tracker, vec![Err(Errno::ECHILD)]), "");
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_reports_and_forgets_finished_jobs() {
        let mut tracker = JobTracker::new();
        tracker.add_job(pid(10));
        tracker.add_job(pid(11));
        tracker.add_job(pid(12));

        let report = sweep(
            &mut tracker,
            vec![
                Ok(Some((pid(11), TerminationResult::Exited(0)))),
                Ok(Some((pid(10), TerminationResult::Signaled(15)))),
            ],
        );

        assert_eq!(
            report,
            "background pid 11 is done: exit value 0\n\
             background pid 10 is done: terminated by signal 15\n"
        );
        assert_eq!(tracker.len(), 1);
        assert_eq!(
            sweep(&mut tracker, vec![Ok(Some((pid(12), TerminationResult::Exited(0))))]),
            "background pid 12 is done: exit value 0\n"
        );
    }

    #[test]
    fn test_untracked_children_are_ignored() {
        let mut tracker = JobTracker::new();
        tracker.add_job(pid(20));

        let report = sweep(
            &mut tracker,
            vec![
                Ok(Some((pid(99), TerminationResult::Exited(1)))),
                Err(Errno::EINTR),
                Ok(Some((pid(20), TerminationResult::Exited(2)))),
            ],
        );

        assert_eq!(report, "background pid 20 is done: exit value 2\n");
        assert_eq!(tracker.len(), 0);
    }

    #[test]
    fn test_each_job_reported_once() {
        let mut tracker = JobTracker::new();
        tracker.add_job(pid(30));

        let first = sweep(
            &mut tracker,
            vec![Ok(Some((pid(30), TerminationResult::Exited(0))))],
        );
        let second = sweep(
            &mut tracker,
            vec![Ok(Some((pid(30), TerminationResult::Exited(0))))],
        );

        assert_eq!(first, "background pid 30 is done: exit value 0\n");
        assert_eq!(second, "");
    }
}
