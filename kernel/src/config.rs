//! Capacities and runtime policy for the introspection core.

use bitflags::bitflags;

/// Number of process slots in the table.
pub const NPROC: usize = 64;

/// Number of namespace nodes the forest can hold.
pub const NNAMESPACES: usize = 16;

/// Deepest allowed namespace (a root namespace has depth 0).
///
/// Enforced when a namespace is created, so visibility walks never take
/// more than `MAX_NS_DEPTH + 1` steps.
pub const MAX_NS_DEPTH: u32 = 8;

bitflags! {
    /// Policy switches for the `ps_info` path.
    ///
    /// `ps_list` always filters by namespace. `ps_info` historically does
    /// not: any known pid can be inspected from anywhere. These flags opt
    /// into stricter behaviour.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IntrospectFlags: u32 {
        /// Targets outside the caller's namespace scope fail with NotFound.
        const ISOLATE_INFO         = 1 << 0;

        /// A target whose parent lives outside the caller's scope reports
        /// ppid 0 and parent id 0, the way a namespace's first process
        /// sees its parent.
        const HIDE_FOREIGN_PARENTS = 1 << 1;
    }
}

/// Runtime configuration handed to `Kernel::new`.
#[derive(Debug, Clone, Copy)]
pub struct KernelConfig {
    pub flags: IntrospectFlags,
    /// First raw pid handed out by the allocator.
    pub first_pid: u32,
}

impl KernelConfig {
    pub const fn new() -> Self {
        Self {
            flags: IntrospectFlags::empty(),
            first_pid: 1,
        }
    }

    pub const fn with_flags(mut self, flags: IntrospectFlags) -> Self {
        self.flags = flags;
        self
    }

    pub const fn with_first_pid(mut self, first_pid: u32) -> Self {
        self.first_pid = first_pid;
        self
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}
