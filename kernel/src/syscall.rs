//! Syscall dispatch for the introspection calls.
//!
//! The trap entry stub saves the user context, identifies the current
//! process and calls [`dispatch`] with the raw register values. This is the
//! only place where typed errors are flattened to `ERR`.

use nest_sys::{ERR, nr};

use crate::Kernel;
use crate::introspect::{self, IntrospectError};
use crate::task::identity::IdentityResolver;
use crate::task::process::Current;
use crate::uaccess::{UserAddr, UserSpace};

/// Run syscall `nr` on behalf of `caller`.
///
/// Register convention (Linux-style):
///   a0 = RDI, a1 = RSI
///   return value in RAX, `ERR` on failure
pub fn dispatch<R: IdentityResolver>(
	kernel: &Kernel<R>,
	caller: &Current,
	user: &mut dyn UserSpace,
	nr: u64,
	a0: u64,
	a1: u64,
) -> u64 {
	match nr {
		nr::SYS_GETPID => introspect::getpid(kernel, caller) as u64,
		nr::SYS_GETPPID => match introspect::getppid(kernel, caller) {
			Ok(ppid) => ppid as u64,
			Err(e) => fail(caller, "SYS_GETPPID", e),
		},
		nr::SYS_PS_LIST => {
			// a0 = limit (i32), a1 = pids buffer
			let limit = a0 as i32;
			match introspect::list_processes(kernel, caller, limit, user, UserAddr::new(a1)) {
				Ok(total) => total as u64,
				Err(e) => fail(caller, "SYS_PS_LIST", e),
			}
		}
		nr::SYS_PS_INFO => {
			// a0 = pid (i32), a1 = ProcessInfo buffer
			let pid = a0 as i32;
			match introspect::process_info(kernel, caller, pid, user, UserAddr::new(a1)) {
				Ok(()) => 0,
				Err(e) => fail(caller, "SYS_PS_INFO", e),
			}
		}
		_ => {
			klog::warn!("[syscall] unknown syscall {} from pid {}", nr, caller.pid());
			ERR
		}
	}
}

fn fail(caller: &Current, call: &str, e: IntrospectError) -> u64 {
	klog::warn!("[syscall] {} from pid {} failed: {}", call, caller.pid(), e);
	ERR
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::KernelConfig;
	use crate::uaccess::SliceSpace;

	#[test]
	fn errors_flatten_to_err() {
		let kernel = Kernel::new(KernelConfig::new());
		let root = kernel.namespaces.create(None).unwrap();
		let init = kernel.procs.spawn(&kernel.namespaces, "init", root, None).unwrap();
		let mut mem = [0u8; 64];
		let mut user = SliceSpace::new(0x1000, &mut mem);

		assert_eq!(dispatch(&kernel, &init, &mut user, nr::SYS_GETPID, 0, 0), 1);
		assert_eq!(dispatch(&kernel, &init, &mut user, nr::SYS_GETPPID, 0, 0), 0);
		assert_eq!(dispatch(&kernel, &init, &mut user, nr::SYS_PS_LIST, 16, 0x1000), 1);
		assert_eq!(dispatch(&kernel, &init, &mut user, nr::SYS_PS_INFO, 1, 0x1000), 0);

		// -1 in the low 32 bits, as a 32-bit userspace int sign-extends to.
		assert_eq!(dispatch(&kernel, &init, &mut user, nr::SYS_PS_LIST, u64::MAX, 0x1000), ERR);
		assert_eq!(dispatch(&kernel, &init, &mut user, nr::SYS_PS_INFO, u64::MAX, 0x1000), ERR);
		assert_eq!(dispatch(&kernel, &init, &mut user, nr::SYS_PS_INFO, 7, 0x1000), ERR);
		assert_eq!(dispatch(&kernel, &init, &mut user, 999, 0, 0), ERR);
	}
}
