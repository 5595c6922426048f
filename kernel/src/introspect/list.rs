//! `ps_list`: enumerate the processes a caller can see.

use nest_sys::PID_SIZE;

use super::IntrospectError;
use crate::Kernel;
use crate::config::NPROC;
use crate::task::process::Current;
use crate::uaccess::{UserAddr, UserSpace};

/// Write up to `limit` visible raw pids to `dst` and return how many are
/// visible in total.
///
/// A process is visible when its namespace is the caller's or nested below
/// it. The total can exceed `limit`; callers grow their buffer and retry.
/// Pids appear in slot order.
pub fn list_processes<R>(
    kernel: &Kernel<R>,
    caller: &Current,
    limit: i32,
    user: &mut dyn UserSpace,
    dst: UserAddr,
) -> Result<usize, IntrospectError> {
    let limit = usize::try_from(limit).map_err(|_| IntrospectError::InvalidArgument)?;

    // No scan can see more than every slot.
    let mut scratch = [0u8; NPROC * PID_SIZE];
    let mut staged = 0;
    let mut total = 0;
    {
        let alloc = kernel.procs.lock_alloc();
        let mut rel = alloc.relations();
        for index in 0..NPROC {
            let rec = rel.lock_slot(index);
            if rec.is_unused() || !kernel.namespaces.contains(caller.ns(), rec.ns()) {
                continue;
            }
            total += 1;
            if staged < limit {
                let at = staged * PID_SIZE;
                scratch[at..at + PID_SIZE].copy_from_slice(&(rec.pid() as i32).to_ne_bytes());
                staged += 1;
            }
        }
    }

    user.copy_out(dst, &scratch[..staged * PID_SIZE])?;
    klog::trace!(
        "[ps] list from pid {}: {} visible, {} copied",
        caller.pid(),
        total,
        staged
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::uaccess::SliceSpace;

    const BASE: u64 = 0x1000;

    fn read_pids(mem: &[u8], n: usize) -> Vec<i32> {
        mem.chunks_exact(PID_SIZE)
            .take(n)
            .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn count_only_calls_and_short_buffers() {
        let kernel = Kernel::new(KernelConfig::new());
        let root = kernel.namespaces.create(None).unwrap();
        let init = kernel.procs.spawn(&kernel.namespaces, "init", root, None).unwrap();
        for name in ["a", "b", "c"] {
            kernel
                .procs
                .spawn(&kernel.namespaces, name, root, Some(init.handle()))
                .unwrap();
        }

        // Zero capacity never touches user memory, even through a null pointer.
        let mut empty = [0u8; 0];
        let mut space = SliceSpace::new(BASE, &mut empty);
        let total = list_processes(&kernel, &init, 0, &mut space, UserAddr::new(0)).unwrap();
        assert_eq!(total, 4);

        let mut mem = [0u8; 2 * PID_SIZE];
        let mut space = SliceSpace::new(BASE, &mut mem);
        let total = list_processes(&kernel, &init, 2, &mut space, UserAddr::new(BASE)).unwrap();
        assert_eq!(total, 4);
        assert_eq!(read_pids(&mem, 2), vec![1, 2]);
        assert!(kernel.procs.is_quiescent());
    }

    #[test]
    fn negative_limit_is_rejected() {
        let kernel = Kernel::new(KernelConfig::new());
        let root = kernel.namespaces.create(None).unwrap();
        let init = kernel.procs.spawn(&kernel.namespaces, "init", root, None).unwrap();
        let mut mem = [0u8; 4];
        let mut space = SliceSpace::new(BASE, &mut mem);
        assert_eq!(
            list_processes(&kernel, &init, -1, &mut space, UserAddr::new(BASE)),
            Err(IntrospectError::InvalidArgument)
        );
        assert!(kernel.procs.is_quiescent());
    }

    #[test]
    fn faulting_buffer_reports_a_copy_fault_after_unlocking() {
        let kernel = Kernel::new(KernelConfig::new());
        let root = kernel.namespaces.create(None).unwrap();
        let init = kernel.procs.spawn(&kernel.namespaces, "init", root, None).unwrap();
        let mut mem = [0u8; 4];
        let mut space = SliceSpace::new(BASE, &mut mem);
        let err = list_processes(&kernel, &init, 1, &mut space, UserAddr::new(BASE + 64));
        assert!(matches!(err, Err(IntrospectError::CopyFault(_))));
        assert!(kernel.procs.is_quiescent());
    }
}
