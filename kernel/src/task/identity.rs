//! Identity resolution: raw pid to namespace-relative pid.
//!
//! Contract every resolver honours:
//! - the result is stable for the lifetime of one slot occupancy;
//! - it never blocks and has no side effects;
//! - it is only asked about a record whose lock the caller holds, or about
//!   the caller itself (its `Current` copy).
//!
//! The `Identity` argument encodes the last rule: outside the owner it can
//! only be read through a `RecordGuard`.

use super::process::{Identity, RecordGuard};

/// Maps an identity to the number a process sees as its pid.
pub trait IdentityResolver: Sync {
    fn resolve(&self, identity: &Identity) -> u32;
}

/// Pids count from 1 inside each namespace, like a container's init.
///
/// The number is drawn from the namespace's counter when the process is
/// created, which is what makes it stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NsLocalResolver;

impl IdentityResolver for NsLocalResolver {
    fn resolve(&self, identity: &Identity) -> u32 {
        identity.local_pid
    }
}

/// No virtualization: every namespace sees raw pids.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalResolver;

impl IdentityResolver for GlobalResolver {
    fn resolve(&self, identity: &Identity) -> u32 {
        identity.pid
    }
}

/// Resolved id of `rec`'s parent, or 0 for the root process.
///
/// Locks the parent for the duration of the lookup (child → parent order).
pub fn resolve_parent<R: IdentityResolver + ?Sized>(resolver: &R, rec: &RecordGuard<'_>) -> u32 {
    rec.lock_parent()
        .map_or(0, |parent| resolver.resolve(&parent.identity()))
}
