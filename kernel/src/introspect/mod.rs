//! Process introspection services.
//!
//! - [`list::list_processes`]: raw pids visible from the caller's namespace.
//! - [`info::process_info`]: a full snapshot of one process by raw pid.
//! - [`getpid`] / [`getppid`]: the caller's own namespace-relative ids.
//!
//! Both services hold the allocation and relationship locks for the whole
//! scan, so each call observes one consistent table state. Results are
//! staged on the kernel stack and copied out only after every lock is
//! released.

pub mod info;
pub mod list;

use core::fmt;

use crate::Kernel;
use crate::task::identity::{IdentityResolver, resolve_parent};
use crate::task::process::Current;
use crate::uaccess::CopyFault;

pub use info::process_info;
pub use list::list_processes;

/// Why an introspection call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrospectError {
    /// Negative limit or pid.
    InvalidArgument,
    /// No live process has the pid (or it is out of scope, see
    /// `IntrospectFlags::ISOLATE_INFO`).
    NotFound,
    /// Writing the result to user memory failed.
    CopyFault(CopyFault),
}

impl fmt::Display for IntrospectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntrospectError::InvalidArgument => f.write_str("invalid argument"),
            IntrospectError::NotFound => f.write_str("no such process"),
            IntrospectError::CopyFault(fault) => write!(f, "{}", fault),
        }
    }
}

impl From<CopyFault> for IntrospectError {
    fn from(fault: CopyFault) -> Self {
        IntrospectError::CopyFault(fault)
    }
}

/// The caller's namespace-relative pid. Reads only the caller's own
/// immutable identity, so no lock is taken.
pub fn getpid<R: IdentityResolver>(kernel: &Kernel<R>, caller: &Current) -> u32 {
    kernel.resolver.resolve(caller.identity())
}

/// The caller's namespace-relative parent id, 0 for the root process.
///
/// The parent link is relationship state, so it is read under the
/// relationship lock and the caller's record lock.
pub fn getppid<R: IdentityResolver>(
    kernel: &Kernel<R>,
    caller: &Current,
) -> Result<u32, IntrospectError> {
    let mut rel = kernel.procs.relations();
    let rec = rel.lock(caller.handle()).ok_or(IntrospectError::NotFound)?;
    Ok(resolve_parent(&kernel.resolver, &rec))
}
