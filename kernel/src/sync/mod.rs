// =============================================================================
// NestOS: Kernel Synchronization Primitives
// =============================================================================
//
// In a kernel, we can't use std::sync (there is no std). We need our own
// primitives that work in a bare-metal, multi-core, interrupt-driven
// environment.
//
// IMPORTANT: Process table lock ordering (outermost first):
//   Level 1 (outermost): allocation-wide lock   `ProcTable::lock_alloc`
//   Level 2:             relationship-wide lock `AllocGuard::relations`
//   Level 3 (innermost): per-record locks       `RelationGuard::lock_slot`
//
// Locks are released in reverse order. The guard types enforce the first
// two levels: a `RelationGuard` taken from an `AllocGuard` borrows it, so
// the compiler refuses to drop the allocation lock first.
//
// Per-record rules:
//   - A table scan holds at most ONE record lock at any instant. Record
//     guards from a `RelationGuard` borrow it mutably, so the compiler
//     rejects a second one while the first is alive.
//   - The only path that holds two record locks is parent traversal: child
//     first, then its parent, always moving toward the root. The parent
//     graph is a forest, so this can never form a cycle.
//
// NEVER acquire an outer lock while holding an inner one.
// Violating this WILL cause deadlocks on multi-core.
// =============================================================================

pub mod spinlock;
