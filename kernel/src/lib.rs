// =============================================================================
// NestOS: Process Introspection Core
// =============================================================================
//
// Answers two questions for a running process:
//   "which processes can I see?"   → `introspect::list_processes` (ps_list)
//   "what is process N?"           → `introspect::process_info`   (ps_info)
//
// WHAT LIVES HERE:
//   config      table capacities and the runtime policy flags
//   sync        ticket spinlock + the table lock order
//   task        process table, namespace forest, identity resolution
//   uaccess     the copy-out contract to user memory
//   introspect  the services themselves
//   syscall     register-level dispatch, errors flattened to `ERR`
//
// WHAT DOES NOT:
//   Boot, paging, the scheduler and the trap entry stub. They own the
//   `Current` of the running process and call `syscall::dispatch` with it.
//
// Nothing in this crate allocates. The table and the forest are fixed
// arrays and every scan stages its results on the kernel stack.
// =============================================================================

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod config;
pub mod introspect;
pub mod sync;
pub mod syscall;
pub mod task;
pub mod uaccess;

use spin::Once;

use config::KernelConfig;
use task::identity::NsLocalResolver;
use task::namespace::NamespaceTree;
use task::process::ProcTable;

/// Everything the introspection paths read: the process table, the
/// namespace forest, the policy and the identity mapping.
pub struct Kernel<R = NsLocalResolver> {
    pub procs: ProcTable,
    pub namespaces: NamespaceTree,
    pub config: KernelConfig,
    pub resolver: R,
}

impl Kernel {
    /// A kernel with namespace-local pids.
    pub const fn new(config: KernelConfig) -> Self {
        Self::with_resolver(config, NsLocalResolver)
    }
}

impl<R> Kernel<R> {
    pub const fn with_resolver(config: KernelConfig, resolver: R) -> Self {
        Self {
            procs: ProcTable::new(config.first_pid),
            namespaces: NamespaceTree::new(),
            config,
            resolver,
        }
    }
}

// ── Global instance ─────────────────────────────────────────────

static KERNEL: Once<Kernel> = Once::new();

/// Bring up the global kernel instance.
///
/// Only the first call's config is used; later calls return the same
/// instance.
pub fn init(config: KernelConfig) -> &'static Kernel {
    let kernel = KERNEL.call_once(|| Kernel::new(config));
    klog::info!(
        "[kernel] process table ready ({} slots, {} namespaces, flags {:?})",
        config::NPROC,
        config::NNAMESPACES,
        kernel.config.flags
    );
    kernel
}

/// The global instance, if `init` has run.
pub fn get() -> Option<&'static Kernel> {
    KERNEL.get()
}
