// =============================================================================
// NestOS: Architecture Abstraction
// =============================================================================
//
// The introspection core only needs one thing from the CPU: saving and
// masking the local interrupt flag around spinlock critical sections.
//
// On bare-metal x86_64 that is RFLAGS.IF via PUSHFQ/CLI/STI. On hosted
// targets (unit tests, the hosted `ps` runner) there are no interrupts to
// mask and CLI would fault in ring 3, so the hooks compile to nothing.
//
// To add a new architecture:
//   1. Add a `#[cfg(all(target_arch = "...", target_os = "none"))]` module
//      with the same `irq` interface
//   2. Everything else just works
// =============================================================================

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[path = "x86_64/irq.rs"]
pub mod irq;

#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
pub mod irq {
    //! Hosted stand-in: there is no interrupt flag to manage.

    #[inline(always)]
    pub fn save_and_disable() -> bool {
        false
    }

    #[inline(always)]
    pub fn restore(_was_enabled: bool) {}
}
