//! `ps`: report on the processes visible to the caller.
//!
//! ```text
//! ps pid      pid: N            (own namespace-relative id)
//! ps ppid     parent pid: N     (parent's namespace-relative id)
//! ps count    N                 (number of visible processes)
//! ps pids     one raw pid per line
//! ps list     one tab-separated row per process
//! ```
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod hosted;

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{self, Write};

use libnest::{Introspect, SysError};
use nest_sys::ProcState;

pub const USAGE: &str = "usage: ps <pid|ppid|count|pids|list>";

/// Column header for `ps list`.
pub const LIST_HEADER: &str = "pid\tstate\t\tppid\tnmspc\tgpid\tgppid\tname";

/// First buffer size tried by the growth loop.
const INITIAL_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsError<'a> {
    ArgCount(usize),
    UnknownArgument(&'a str),
    Sys(SysError),
    Output,
}

impl PsError<'_> {
    fn shows_usage(&self) -> bool {
        matches!(self, PsError::ArgCount(_) | PsError::UnknownArgument(_))
    }
}

impl fmt::Display for PsError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PsError::ArgCount(n) => write!(f, "expected 1 argument, got {}", n),
            PsError::UnknownArgument(arg) => write!(f, "unknown argument: {}", arg),
            PsError::Sys(e) => write!(f, "{}", e),
            PsError::Output => f.write_str("write error"),
        }
    }
}

impl From<SysError> for PsError<'_> {
    fn from(e: SysError) -> Self {
        PsError::Sys(e)
    }
}

impl From<fmt::Error> for PsError<'_> {
    fn from(_: fmt::Error) -> Self {
        PsError::Output
    }
}

/// Run `ps` with `args` (program name excluded) and return the exit code.
///
/// Normal output goes to `out`, diagnostics to `err`.
pub fn run<S: Introspect + ?Sized>(
    sys: &mut S,
    args: &[&str],
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> i32 {
    match execute(sys, args, out) {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(err, "ps: {}", e);
            if e.shows_usage() {
                let _ = writeln!(err, "{}", USAGE);
            }
            1
        }
    }
}

fn execute<'a, S: Introspect + ?Sized>(
    sys: &mut S,
    args: &[&'a str],
    out: &mut dyn Write,
) -> Result<(), PsError<'a>> {
    let [cmd] = args else {
        return Err(PsError::ArgCount(args.len()));
    };
    match *cmd {
        "pid" => writeln!(out, "pid: {}", sys.getpid()?)?,
        "ppid" => writeln!(out, "parent pid: {}", sys.getppid()?)?,
        "count" => writeln!(out, "{}", sys.ps_list(&mut [])?)?,
        "pids" => {
            for pid in visible_pids(sys)? {
                writeln!(out, "{}", pid)?;
            }
        }
        "list" => list(sys, out)?,
        other => return Err(PsError::UnknownArgument(other)),
    }
    Ok(())
}

/// All visible raw pids.
///
/// Starts with room for `INITIAL_CAPACITY` pids and doubles until the
/// buffer holds the total the kernel reports. Processes can appear between
/// calls, so every round re-checks.
pub fn visible_pids<S: Introspect + ?Sized>(sys: &mut S) -> Result<Vec<i32>, SysError> {
    let mut pids = vec![0; INITIAL_CAPACITY];
    loop {
        let total = sys.ps_list(&mut pids)?;
        if total <= pids.len() {
            pids.truncate(total);
            return Ok(pids);
        }
        let mut limit = pids.len();
        while limit < total {
            limit *= 2;
        }
        pids = vec![0; limit];
    }
}

fn list<'a, S: Introspect + ?Sized>(sys: &mut S, out: &mut dyn Write) -> Result<(), PsError<'a>> {
    let pids = visible_pids(sys)?;
    writeln!(out, "{}", LIST_HEADER)?;
    for pid in pids {
        let info = sys.ps_info(pid)?;
        let state = info.proc_state().unwrap_or(ProcState::Zombie).token();
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            pid,
            state,
            info.ppid,
            info.nmspace_id,
            info.getpid,
            info.getppid,
            info.name()
        )?;
    }
    Ok(())
}
