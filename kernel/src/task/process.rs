//! Process table: fixed slots, generation-checked handles, lock guards.
//!
//! The table is a flat arena of `NPROC` slots, each behind its own record
//! lock. Two table-wide locks sit in front of the slots:
//!
//! - the **allocation** lock guards the raw pid allocator and, by
//!   convention, slot occupancy;
//! - the **relationship** lock guards parent linkage.
//!
//! See `crate::sync` for the order they are taken in. The guard types in
//! this module are the only way to reach a record, so every lock taken is
//! released on every exit path.
//!
//! Slots are addressed by [`ProcHandle`]s that carry the slot generation.
//! Recycling a slot bumps its generation, so a handle to the previous
//! occupant (for example a child's parent link) fails the checked lookup
//! instead of silently naming the new process.

use core::fmt;
use core::ops::Deref;

use nest_sys::{PROC_NAME_LEN, ProcState};

use super::namespace::{NamespaceTree, NsId};
use crate::config::NPROC;
use crate::sync::spinlock::{SpinLock, SpinLockGuard};

// ── Handles ─────────────────────────────────────────────────────

/// Generation-guarded reference to a table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcHandle {
    index: u32,
    generation: u32,
}

impl ProcHandle {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ProcHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}#{}", self.index, self.generation)
    }
}

// ── Identity ────────────────────────────────────────────────────

/// The fields of a record that never change while its slot stays occupied.
///
/// Outside the owning process, an `Identity` can only be obtained through
/// a held [`RecordGuard`]; the owner keeps its own copy in [`Current`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Kernel-global pid.
    pub pid: u32,
    /// Pid assigned by the owning namespace at creation.
    pub local_pid: u32,
    pub ns: NsId,
}

/// A running process's view of itself.
///
/// Produced when the process is created and carried by its execution
/// context; reading it needs no lock because every field is immutable for
/// the lifetime of the occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Current {
    handle: ProcHandle,
    identity: Identity,
}

impl Current {
    pub fn handle(&self) -> ProcHandle {
        self.handle
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn pid(&self) -> u32 {
        self.identity.pid
    }

    pub fn ns(&self) -> NsId {
        self.identity.ns
    }
}

// ── Records ─────────────────────────────────────────────────────

/// One process slot.
pub struct ProcRecord {
    identity: Identity,
    name: [u8; PROC_NAME_LEN],
    state: ProcState,
    parent: Option<ProcHandle>,
    generation: u32,
}

impl ProcRecord {
    const fn unused() -> Self {
        Self {
            identity: Identity {
                pid: 0,
                local_pid: 0,
                ns: NsId::from_raw(0),
            },
            name: [0; PROC_NAME_LEN],
            state: ProcState::Unused,
            parent: None,
            generation: 0,
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn pid(&self) -> u32 {
        self.identity.pid
    }

    pub fn ns(&self) -> NsId {
        self.identity.ns
    }

    pub fn name(&self) -> &str {
        nest_sys::decode_name(&self.name)
    }

    /// The NUL-padded name field as stored.
    pub fn name_bytes(&self) -> &[u8; PROC_NAME_LEN] {
        &self.name
    }

    pub fn state(&self) -> ProcState {
        self.state
    }

    pub fn is_unused(&self) -> bool {
        self.state == ProcState::Unused
    }

    /// Link to the parent's slot, `None` for the root process.
    pub fn parent(&self) -> Option<ProcHandle> {
        self.parent
    }
}

// ── Errors ──────────────────────────────────────────────────────

/// Errors from the table's lifecycle entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcError {
    /// Every slot is occupied.
    TableFull,
    /// The pid space (1..=i32::MAX) is used up.
    PidsExhausted,
    /// The namespace has handed out every local pid up to `i32::MAX`.
    LocalPidsExhausted(NsId),
    NoSuchNamespace(NsId),
    /// The parent handle does not name a live process.
    NoSuchParent,
    /// The handle's slot has been recycled (or was never occupied).
    StaleHandle,
}

impl fmt::Display for ProcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcError::TableFull => f.write_str("process table full"),
            ProcError::PidsExhausted => f.write_str("no pids left"),
            ProcError::LocalPidsExhausted(ns) => write!(f, "no local pids left in {}", ns),
            ProcError::NoSuchNamespace(ns) => write!(f, "namespace {} does not exist", ns),
            ProcError::NoSuchParent => f.write_str("parent process does not exist"),
            ProcError::StaleHandle => f.write_str("stale process handle"),
        }
    }
}

// ── Pid allocator ───────────────────────────────────────────────

/// Raw pid allocator, guarded by the allocation-wide lock.
pub struct PidAllocator {
    next: u32,
}

impl PidAllocator {
    const fn new(first_pid: u32) -> Self {
        Self {
            next: if first_pid == 0 { 1 } else { first_pid },
        }
    }

    /// Next unused pid. Pids must stay representable as a positive `i32`
    /// because that is how userspace sees them.
    fn alloc(&mut self) -> Option<u32> {
        let pid = self.next;
        if !self.has_next() {
            return None;
        }
        self.next += 1;
        Some(pid)
    }

    fn has_next(&self) -> bool {
        self.next <= i32::MAX as u32
    }
}

// ── The table ───────────────────────────────────────────────────

/// The global process table.
pub struct ProcTable {
    alloc: SpinLock<PidAllocator>,
    relations: SpinLock<()>,
    slots: [SpinLock<ProcRecord>; NPROC],
}

impl ProcTable {
    pub const fn new(first_pid: u32) -> Self {
        Self {
            alloc: SpinLock::new(PidAllocator::new(first_pid)),
            relations: SpinLock::new(()),
            slots: [const { SpinLock::new(ProcRecord::unused()) }; NPROC],
        }
    }

    /// Take the allocation-wide lock (level 1).
    pub fn lock_alloc(&self) -> AllocGuard<'_> {
        AllocGuard {
            table: self,
            pids: self.alloc.lock(),
        }
    }

    /// Take the relationship-wide lock (level 2) without the allocation
    /// lock, for paths that read linkage but never allocate.
    pub fn relations(&self) -> RelationGuard<'_> {
        RelationGuard {
            table: self,
            _held: self.relations.lock(),
        }
    }

    /// Lock the record a handle refers to (level 3).
    ///
    /// Fails if the slot has been recycled since the handle was issued.
    pub fn lock(&self, handle: ProcHandle) -> Option<RecordGuard<'_>> {
        let rec = self.lock_index(handle.index());
        (rec.generation == handle.generation && !rec.is_unused()).then_some(rec)
    }

    fn lock_index(&self, index: usize) -> RecordGuard<'_> {
        RecordGuard {
            table: self,
            index,
            rec: self.slots[index].lock(),
        }
    }

    /// True when no table lock of any level is held.
    pub fn is_quiescent(&self) -> bool {
        !self.alloc.is_locked()
            && !self.relations.is_locked()
            && self.slots.iter().all(|slot| !slot.is_locked())
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        let alloc = self.lock_alloc();
        let mut rel = alloc.relations();
        (0..NPROC).filter(|&i| !rel.lock_slot(i).is_unused()).count()
    }

    // ── Lifecycle ───────────────────────────────────────────────
    //
    // Creation, state changes and recycling belong to fork/exit/wait and
    // the scheduler. These are the minimal versions the introspection
    // paths need to have something to look at; they follow the same lock
    // order.

    /// Occupy a free slot with a new process in namespace `ns`.
    ///
    /// The process starts out `Allocated`. `parent` is `None` only for the
    /// system's root process. Pids are drawn only once the parent and a
    /// free slot are known, so a failed spawn leaves both counters as they
    /// were.
    pub fn spawn(
        &self,
        namespaces: &NamespaceTree,
        name: &str,
        ns: NsId,
        parent: Option<ProcHandle>,
    ) -> Result<Current, ProcError> {
        let node = namespaces.get(ns).ok_or(ProcError::NoSuchNamespace(ns))?;

        let mut alloc = self.lock_alloc();
        let (pids, mut rel) = alloc.split();

        if let Some(parent) = parent {
            rel.lock(parent).ok_or(ProcError::NoSuchParent)?;
        }

        let Some(mut slot) = rel.lock_free_slot() else {
            klog::warn!("[proc] spawn '{}': process table full", name);
            return Err(ProcError::TableFull);
        };
        if !pids.has_next() {
            return Err(ProcError::PidsExhausted);
        }
        let local_pid = node
            .alloc_local_pid()
            .ok_or(ProcError::LocalPidsExhausted(ns))?;
        let pid = pids.alloc().ok_or(ProcError::PidsExhausted)?;

        let identity = Identity { pid, local_pid, ns };
        let rec = &mut *slot.rec;
        rec.identity = identity;
        rec.name = nest_sys::encode_name(name);
        rec.state = ProcState::Allocated;
        rec.parent = parent;

        let handle = slot.handle();
        klog::debug!("[proc] spawned pid {} '{}' in {} ({})", pid, name, ns, handle);
        Ok(Current { handle, identity })
    }

    /// Move a live process to another scheduling state.
    ///
    /// Use `release` to free a slot; `Unused` is rejected here.
    pub fn set_state(&self, handle: ProcHandle, state: ProcState) -> Result<(), ProcError> {
        if state == ProcState::Unused {
            return Err(ProcError::StaleHandle);
        }
        let mut rec = self.lock(handle).ok_or(ProcError::StaleHandle)?;
        rec.rec.state = state;
        Ok(())
    }

    /// Recycle a slot to `Unused` and bump its generation.
    pub fn release(&self, handle: ProcHandle) -> Result<(), ProcError> {
        let alloc = self.lock_alloc();
        let mut rel = alloc.relations();
        let mut slot = rel.lock(handle).ok_or(ProcError::StaleHandle)?;
        let pid = slot.pid();

        let generation = slot.rec.generation.wrapping_add(1);
        *slot.rec = ProcRecord::unused();
        slot.rec.generation = generation;

        klog::debug!("[proc] released pid {} ({})", pid, handle);
        Ok(())
    }
}

// ── Guards ──────────────────────────────────────────────────────

/// Proof that the allocation-wide lock is held.
pub struct AllocGuard<'t> {
    table: &'t ProcTable,
    pids: SpinLockGuard<'t, PidAllocator>,
}

impl AllocGuard<'_> {
    /// Take the relationship-wide lock under this one.
    ///
    /// The result borrows `self`, so it is always released first.
    pub fn relations(&self) -> RelationGuard<'_> {
        RelationGuard {
            table: self.table,
            _held: self.table.relations.lock(),
        }
    }

    /// Like `relations`, but keeps the pid allocator usable while the
    /// relationship lock is held.
    fn split(&mut self) -> (&mut PidAllocator, RelationGuard<'_>) {
        let table = self.table;
        let rel = RelationGuard {
            table,
            _held: table.relations.lock(),
        };
        (&mut *self.pids, rel)
    }
}

/// Proof that the relationship-wide lock is held.
///
/// Record locks taken through it borrow it mutably, so a scan cannot lock
/// a second slot while the first guard is alive:
///
/// ```compile_fail
/// use nestos_kernel::task::ProcTable;
///
/// let table = ProcTable::new(1);
/// let mut rel = table.relations();
/// let first = rel.lock_slot(0);
/// let second = rel.lock_slot(1);
/// drop((first, second));
/// ```
pub struct RelationGuard<'a> {
    table: &'a ProcTable,
    _held: SpinLockGuard<'a, ()>,
}

impl RelationGuard<'_> {
    /// Lock slot `index`, occupied or not. Used by full-table scans.
    pub fn lock_slot(&mut self, index: usize) -> RecordGuard<'_> {
        self.table.lock_index(index)
    }

    /// Checked lookup by handle; see `ProcTable::lock`.
    pub fn lock(&mut self, handle: ProcHandle) -> Option<RecordGuard<'_>> {
        self.table.lock(handle)
    }

    /// Linear search for the first occupied slot holding `pid`.
    ///
    /// Slots are locked one at a time; the match is returned still locked.
    pub fn find_pid(&mut self, pid: u32) -> Option<RecordGuard<'_>> {
        let table = self.table;
        (0..NPROC)
            .map(move |index| table.lock_index(index))
            .find(|rec| !rec.is_unused() && rec.pid() == pid)
    }

    fn lock_free_slot(&mut self) -> Option<RecordGuard<'_>> {
        let table = self.table;
        (0..NPROC)
            .map(move |index| table.lock_index(index))
            .find(|rec| rec.is_unused())
    }
}

/// A held per-record lock.
pub struct RecordGuard<'a> {
    table: &'a ProcTable,
    index: usize,
    rec: SpinLockGuard<'a, ProcRecord>,
}

impl<'a> RecordGuard<'a> {
    pub fn handle(&self) -> ProcHandle {
        ProcHandle {
            index: self.index as u32,
            generation: self.rec.generation,
        }
    }

    /// Lock this record's parent while keeping this record locked.
    ///
    /// This is the one sanctioned way to hold two record locks: child
    /// first, parent second. Returns `None` for the root process, and for
    /// a parent whose slot has been recycled.
    pub fn lock_parent(&self) -> Option<RecordGuard<'a>> {
        let handle = self.rec.parent?;
        let parent = self.table.lock(handle);
        if parent.is_none() {
            klog::warn!("[proc] pid {}: parent {} is gone", self.rec.pid(), handle);
        }
        parent
    }
}

impl Deref for RecordGuard<'_> {
    type Target = ProcRecord;

    fn deref(&self) -> &ProcRecord {
        &self.rec
    }
}
