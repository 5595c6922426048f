//! Running `ps` against an in-process kernel.
//!
//! [`HostedSys`] plays the part of one process: every call goes through
//! `syscall::dispatch` with the same register values the trap stub would
//! pass, and results land in a private buffer that stands in for the
//! process's memory.

use alloc::vec::Vec;
use core::fmt;

use libnest::{Introspect, SysError, check};
use nest_sys::{PID_SIZE, ProcState, ProcessInfo, nr};
use nestos_kernel::Kernel;
use nestos_kernel::syscall::dispatch;
use nestos_kernel::task::{Current, IdentityResolver, NsError, NsLocalResolver, ProcError};
use nestos_kernel::uaccess::SliceSpace;

/// Where the buffer is "mapped" in the hosted process.
const USER_BASE: u64 = 0x40_0000;

pub struct HostedSys<'k, R = NsLocalResolver> {
    kernel: &'k Kernel<R>,
    caller: Current,
    mem: Vec<u8>,
}

impl<'k, R: IdentityResolver> HostedSys<'k, R> {
    pub fn new(kernel: &'k Kernel<R>, caller: Current) -> Self {
        Self {
            kernel,
            caller,
            mem: Vec::new(),
        }
    }

    /// Trap into the kernel with `len` bytes of scratch memory at
    /// `USER_BASE`. A zero-length call passes a null pointer.
    fn call(&mut self, nr: u64, a0: u64, len: usize) -> Result<u64, SysError> {
        self.mem.clear();
        self.mem.resize(len, 0);
        let dst = if len == 0 { 0 } else { USER_BASE };
        let mut user = SliceSpace::new(USER_BASE, &mut self.mem);
        check(nr, dispatch(self.kernel, &self.caller, &mut user, nr, a0, dst))
    }
}

impl<R: IdentityResolver> Introspect for HostedSys<'_, R> {
    fn getpid(&mut self) -> Result<i32, SysError> {
        self.call(nr::SYS_GETPID, 0, 0).map(|pid| pid as i32)
    }

    fn getppid(&mut self) -> Result<i32, SysError> {
        self.call(nr::SYS_GETPPID, 0, 0).map(|pid| pid as i32)
    }

    fn ps_list(&mut self, pids: &mut [i32]) -> Result<usize, SysError> {
        let limit = i32::try_from(pids.len()).unwrap_or(i32::MAX);
        let total = self.call(nr::SYS_PS_LIST, limit as u64, pids.len() * PID_SIZE)? as usize;
        for (pid, raw) in pids.iter_mut().zip(self.mem.chunks_exact(PID_SIZE)).take(total) {
            *pid = i32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }
        Ok(total)
    }

    fn ps_info(&mut self, pid: i32) -> Result<ProcessInfo, SysError> {
        self.call(nr::SYS_PS_INFO, pid as u64, ProcessInfo::SIZE)?;
        let mut raw = [0u8; ProcessInfo::SIZE];
        raw.copy_from_slice(&self.mem[..ProcessInfo::SIZE]);
        Ok(ProcessInfo::from_bytes(&raw))
    }
}

// ── Demo process tree ───────────────────────────────────────────

/// Failure while building the demo tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    Namespace(NsError),
    Process(ProcError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Namespace(e) => write!(f, "{}", e),
            SetupError::Process(e) => write!(f, "{}", e),
        }
    }
}

impl From<NsError> for SetupError {
    fn from(e: NsError) -> Self {
        SetupError::Namespace(e)
    }
}

impl From<ProcError> for SetupError {
    fn from(e: ProcError) -> Self {
        SetupError::Process(e)
    }
}

/// The processes of the demo tree, by name.
pub struct Demo {
    procs: [(&'static str, Current); 3],
}

impl Demo {
    /// Populate `kernel` with three processes in nested namespaces:
    ///
    /// ```text
    /// ns0: init
    ///  └─ ns1: sh     (child of init)
    ///      └─ ns2: ps (child of sh)
    /// ```
    pub fn populate<R>(kernel: &Kernel<R>) -> Result<Self, SetupError> {
        let outer = kernel.namespaces.create(None)?;
        let middle = kernel.namespaces.create(Some(outer))?;
        let inner = kernel.namespaces.create(Some(middle))?;

        let procs = &kernel.procs;
        let init = procs.spawn(&kernel.namespaces, "init", outer, None)?;
        let sh = procs.spawn(&kernel.namespaces, "sh", middle, Some(init.handle()))?;
        let ps = procs.spawn(&kernel.namespaces, "ps", inner, Some(sh.handle()))?;

        procs.set_state(init.handle(), ProcState::Sleeping)?;
        procs.set_state(sh.handle(), ProcState::Sleeping)?;
        procs.set_state(ps.handle(), ProcState::Running)?;

        klog::debug!("[ps] demo tree ready: init {}, sh {}, ps {}", init.pid(), sh.pid(), ps.pid());
        Ok(Self {
            procs: [("init", init), ("sh", sh), ("ps", ps)],
        })
    }

    pub fn find(&self, name: &str) -> Option<Current> {
        self.procs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, current)| current)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.procs.iter().map(|&(name, _)| name)
    }
}
