//! NestOS userspace library.
//!
//! [`Introspect`] is the process-introspection surface a userspace tool
//! programs against. Implementations trap into the kernel however their
//! environment does it; [`check`] turns the raw return into a `Result`.
#![cfg_attr(not(test), no_std)]

use core::fmt;

use nest_sys::{ERR, ProcessInfo, nr};

/// A syscall returned `ERR`.
///
/// The kernel reports no reason, only which call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysError {
    pub nr: u64,
}

impl SysError {
    /// Short name of the failed call, as used in diagnostics.
    pub fn call(&self) -> &'static str {
        match self.nr {
            nr::SYS_GETPID => "getpid",
            nr::SYS_GETPPID => "getppid",
            nr::SYS_PS_LIST => "ps_list",
            nr::SYS_PS_INFO => "ps_info",
            _ => "syscall",
        }
    }
}

impl fmt::Display for SysError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.call())
    }
}

/// Turn a raw syscall return value into a `Result`.
#[inline]
pub fn check(nr: u64, ret: u64) -> Result<u64, SysError> {
    if ret == ERR { Err(SysError { nr }) } else { Ok(ret) }
}

/// Process introspection calls.
pub trait Introspect {
    /// The caller's own namespace-relative pid.
    fn getpid(&mut self) -> Result<i32, SysError>;

    /// The caller's namespace-relative parent id, 0 for the root process.
    fn getppid(&mut self) -> Result<i32, SysError>;

    /// Fill `pids` with visible raw pids and return the total number of
    /// visible processes, which may be larger than `pids.len()`.
    ///
    /// An empty slice just counts.
    fn ps_list(&mut self, pids: &mut [i32]) -> Result<usize, SysError>;

    /// Snapshot of the process with raw pid `pid`.
    fn ps_info(&mut self, pid: i32) -> Result<ProcessInfo, SysError>;
}

impl<T: Introspect + ?Sized> Introspect for &mut T {
    fn getpid(&mut self) -> Result<i32, SysError> {
        (**self).getpid()
    }

    fn getppid(&mut self) -> Result<i32, SysError> {
        (**self).getppid()
    }

    fn ps_list(&mut self, pids: &mut [i32]) -> Result<usize, SysError> {
        (**self).ps_list(pids)
    }

    fn ps_info(&mut self, pid: i32) -> Result<ProcessInfo, SysError> {
        (**self).ps_info(pid)
    }
}
