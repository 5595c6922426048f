//! Copy-out to user memory.
//!
//! The real primitive walks the caller's page table; the introspection
//! paths only depend on its contract: either every byte lands at the
//! destination, or the call fails with a [`CopyFault`] and the syscall
//! returns an error.

use core::fmt;

/// The upper bound of user-space canonical addresses.
/// Anything at or above this address is kernel memory.
pub const USER_SPACE_END: u64 = 0x0000_8000_0000_0000;

/// An address in the calling process's address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAddr(u64);

impl UserAddr {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// A copy to user memory could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyFault {
    pub addr: u64,
    pub len: usize,
}

impl fmt::Display for CopyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "copy-out of {} bytes to {:#x} faulted", self.len, self.addr)
    }
}

/// Validate that a user-space range `[ptr, ptr+len)` is safe for the kernel
/// to write on behalf of a user process.
///
/// Returns `false` if:
/// - `ptr` is null
/// - `ptr + len` overflows
/// - any byte in the range falls in kernel address space
#[inline]
pub fn validate_user_range(ptr: u64, len: usize) -> bool {
    if ptr == 0 {
        return false;
    }
    match ptr.checked_add(len as u64) {
        Some(end) => end <= USER_SPACE_END,
        None => false,
    }
}

/// A process address space the kernel can copy into.
pub trait UserSpace {
    /// Write `src` at `dst`. Called only with a non-empty `src` and a range
    /// that passed `validate_user_range`.
    fn write_bytes(&mut self, dst: UserAddr, src: &[u8]) -> Result<(), CopyFault>;

    /// Copy kernel bytes out to user memory.
    ///
    /// A zero-length copy always succeeds without touching `dst`, so
    /// `ps_list(0, NULL)` works as a count-only query.
    fn copy_out(&mut self, dst: UserAddr, src: &[u8]) -> Result<(), CopyFault> {
        if src.is_empty() {
            return Ok(());
        }
        if !validate_user_range(dst.raw(), src.len()) {
            return Err(CopyFault {
                addr: dst.raw(),
                len: src.len(),
            });
        }
        self.write_bytes(dst, src)
    }
}

/// A user address space backed by one contiguous buffer mapped at `base`.
///
/// Used by the hosted `ps` runner and by tests; any address outside
/// `[base, base + mem.len())` faults.
pub struct SliceSpace<'m> {
    base: u64,
    mem: &'m mut [u8],
}

impl<'m> SliceSpace<'m> {
    pub fn new(base: u64, mem: &'m mut [u8]) -> Self {
        Self { base, mem }
    }

    pub fn base(&self) -> UserAddr {
        UserAddr(self.base)
    }
}

impl UserSpace for SliceSpace<'_> {
    fn write_bytes(&mut self, dst: UserAddr, src: &[u8]) -> Result<(), CopyFault> {
        let fault = CopyFault {
            addr: dst.raw(),
            len: src.len(),
        };
        let start = dst.raw().checked_sub(self.base).ok_or(fault)?;
        let start = usize::try_from(start).map_err(|_| fault)?;
        let window = start
            .checked_add(src.len())
            .and_then(|end| self.mem.get_mut(start..end))
            .ok_or(fault)?;
        window.copy_from_slice(src);
        Ok(())
    }
}
