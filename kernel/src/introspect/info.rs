//! `ps_info`: snapshot one process by raw pid.

use nest_sys::ProcessInfo;

use super::IntrospectError;
use crate::Kernel;
use crate::config::IntrospectFlags;
use crate::task::identity::IdentityResolver;
use crate::task::process::Current;
use crate::uaccess::{UserAddr, UserSpace};

/// Copy a [`ProcessInfo`] for `pid` to `dst`.
///
/// By default any live pid can be inspected from any namespace; the
/// `ISOLATE_INFO` and `HIDE_FOREIGN_PARENTS` flags narrow that.
pub fn process_info<R: IdentityResolver>(
    kernel: &Kernel<R>,
    caller: &Current,
    pid: i32,
    user: &mut dyn UserSpace,
    dst: UserAddr,
) -> Result<(), IntrospectError> {
    let pid = u32::try_from(pid).map_err(|_| IntrospectError::InvalidArgument)?;
    let info = snapshot(kernel, caller, pid)?;
    user.copy_out(dst, &info.to_bytes())?;
    Ok(())
}

/// Build the record under the allocation, relationship and record locks.
/// All of them are released when this returns.
pub fn snapshot<R: IdentityResolver>(
    kernel: &Kernel<R>,
    caller: &Current,
    pid: u32,
) -> Result<ProcessInfo, IntrospectError> {
    let flags = kernel.config.flags;
    let in_scope = |ns| kernel.namespaces.contains(caller.ns(), ns);

    let alloc = kernel.procs.lock_alloc();
    let mut rel = alloc.relations();
    let rec = rel.find_pid(pid).ok_or(IntrospectError::NotFound)?;

    if flags.contains(IntrospectFlags::ISOLATE_INFO) && !in_scope(rec.ns()) {
        klog::debug!("[ps] info: pid {} hidden from pid {}", pid, caller.pid());
        return Err(IntrospectError::NotFound);
    }

    // Raw and resolved parent ids come from one hold of the parent lock.
    let (ppid, getppid) = match rec.lock_parent() {
        Some(parent)
            if !flags.contains(IntrospectFlags::HIDE_FOREIGN_PARENTS) || in_scope(parent.ns()) =>
        {
            (
                parent.pid() as i32,
                kernel.resolver.resolve(&parent.identity()) as i32,
            )
        }
        _ => (0, 0),
    };

    Ok(ProcessInfo {
        name: *rec.name_bytes(),
        state: rec.state().code(),
        ppid,
        nmspace_id: rec.ns().raw() as i32,
        getpid: kernel.resolver.resolve(&rec.identity()) as i32,
        getppid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::uaccess::SliceSpace;
    use nest_sys::ProcState;

    const BASE: u64 = 0x2000;

    #[test]
    fn snapshot_carries_every_field() {
        let kernel = Kernel::new(KernelConfig::new().with_first_pid(10));
        let n0 = kernel.namespaces.create(None).unwrap();
        let n1 = kernel.namespaces.create(Some(n0)).unwrap();
        let a = kernel.procs.spawn(&kernel.namespaces, "init", n0, None).unwrap();
        let b = kernel
            .procs
            .spawn(&kernel.namespaces, "sh", n1, Some(a.handle()))
            .unwrap();
        kernel.procs.set_state(b.handle(), ProcState::Sleeping).unwrap();

        let mut mem = [0u8; ProcessInfo::SIZE];
        let mut space = SliceSpace::new(BASE, &mut mem);
        process_info(&kernel, &b, 11, &mut space, UserAddr::new(BASE)).unwrap();

        let info = ProcessInfo::from_bytes(&mem);
        assert_eq!(info.name(), "sh");
        assert_eq!(info.proc_state(), Some(ProcState::Sleeping));
        assert_eq!(info.ppid, 10);
        assert_eq!(info.nmspace_id, n1.raw() as i32);
        assert_eq!(info.getpid, 1);
        assert_eq!(info.getppid, 1);
        assert!(kernel.procs.is_quiescent());
    }

    #[test]
    fn bad_and_missing_pids() {
        let kernel = Kernel::new(KernelConfig::new());
        let root = kernel.namespaces.create(None).unwrap();
        let init = kernel.procs.spawn(&kernel.namespaces, "init", root, None).unwrap();

        let mut mem = [0u8; ProcessInfo::SIZE];
        let mut space = SliceSpace::new(BASE, &mut mem);
        assert_eq!(
            process_info(&kernel, &init, -1, &mut space, UserAddr::new(BASE)),
            Err(IntrospectError::InvalidArgument)
        );
        assert_eq!(
            process_info(&kernel, &init, 42, &mut space, UserAddr::new(BASE)),
            Err(IntrospectError::NotFound)
        );
        assert!(matches!(
            process_info(&kernel, &init, 1, &mut space, UserAddr::new(0)),
            Err(IntrospectError::CopyFault(_))
        ));
        assert!(kernel.procs.is_quiescent());
    }

    #[test]
    fn free_slots_are_never_reported() {
        let kernel = Kernel::new(KernelConfig::new());
        let root = kernel.namespaces.create(None).unwrap();
        let init = kernel.procs.spawn(&kernel.namespaces, "init", root, None).unwrap();

        // Every free slot holds a zeroed record, pid 0 included.
        let mut mem = [0u8; ProcessInfo::SIZE];
        let mut space = SliceSpace::new(BASE, &mut mem);
        assert_eq!(
            process_info(&kernel, &init, 0, &mut space, UserAddr::new(BASE)),
            Err(IntrospectError::NotFound)
        );
        assert_eq!(mem, [0u8; ProcessInfo::SIZE]);
        assert!(kernel.procs.is_quiescent());
    }
}
