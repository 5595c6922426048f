//! x86_64 local interrupt flag management.
//!
//! These compile down to single instructions (PUSHFQ/POP, CLI, STI) with no
//! function call overhead in release builds.

/// RFLAGS bit 9 (IF, the Interrupt Flag).
const RFLAGS_IF: u64 = 1 << 9;

/// Save the current interrupt state, then disable interrupts on this core.
///
/// Returns whether interrupts were enabled before the call, for `restore`.
#[inline(always)]
pub fn save_and_disable() -> bool {
    let rflags: u64;
    // SAFETY: Reading RFLAGS is a read-only observation of CPU state, and
    // CLI is always allowed in ring 0. The flag is put back by `restore`.
    unsafe {
        core::arch::asm!(
            "pushfq",
            "pop {}",
            out(reg) rflags,
            options(nomem, preserves_flags)
        );
        core::arch::asm!("cli", options(nomem, nostack));
    }
    rflags & RFLAGS_IF != 0
}

/// Re-enable interrupts if they were enabled when the state was saved.
///
/// Note: the CPU guarantees that the instruction AFTER STI executes
/// before any pending interrupt is delivered.
#[inline(always)]
pub fn restore(was_enabled: bool) {
    if was_enabled {
        // SAFETY: We only re-enable when the saved state says they were on.
        unsafe {
            core::arch::asm!("sti", options(nomem, nostack));
        }
    }
}
