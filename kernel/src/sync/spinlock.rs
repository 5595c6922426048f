// =============================================================================
// NestOS: Ticket Spinlock
// =============================================================================
//
// A ticket spinlock provides mutual exclusion in a multi-core kernel.
// It's the simplest fair lock: threads acquire the lock in FIFO order,
// preventing starvation.
//
// HOW IT WORKS:
//   - Two counters: `next_ticket` and `now_serving`
//   - To lock: atomically increment `next_ticket`, get your ticket number.
//     Spin until `now_serving` equals your ticket.
//   - To unlock: increment `now_serving`, which lets the next waiter proceed.
//
// IRQ SAFETY:
//   When we acquire a spinlock, we disable interrupts on the current core
//   first, otherwise an interrupt handler that takes the same lock would
//   spin forever on top of the holder. The previous interrupt state is saved
//   in the guard and restored on unlock, so nested lock/unlock pairs work.
//   See `crate::arch::irq` for what this means on hosted targets.
//
// Every process-table lock (allocation-wide, relationship-wide, per-record)
// is one of these. The order they may be taken in is documented in
// `sync/mod.rs`.
//
// =============================================================================

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, Ordering};

use crate::arch::irq;

/// A ticket-based spinlock that disables interrupts while held.
///
/// # Examples
/// ```
/// use nestos_kernel::sync::spinlock::SpinLock;
///
/// static COUNTER: SpinLock<u64> = SpinLock::new(0);
///
/// {
///     let mut guard = COUNTER.lock();
///     *guard += 1;
/// } // Lock automatically released when guard goes out of scope
/// assert_eq!(*COUNTER.lock(), 1);
/// ```
pub struct SpinLock<T> {
    /// The next ticket to be dispensed (atomically incremented by each locker).
    next_ticket: AtomicU32,

    /// The ticket number currently being served (incremented on unlock).
    now_serving: AtomicU32,

    data: UnsafeCell<T>,
}

// SAFETY: The lock ensures that only one core accesses T at a time, so
// sharing the lock is fine as long as T itself can move between cores.
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates a new, unlocked spinlock wrapping the given value.
    pub const fn new(value: T) -> Self {
        Self {
            next_ticket: AtomicU32::new(0),
            now_serving: AtomicU32::new(0),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, disabling interrupts on the current core.
    ///
    /// The lock is released (and interrupts restored) when the returned
    /// guard is dropped.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        let irq_was_enabled = irq::save_and_disable();

        // Relaxed is fine here; the spin loop below provides the
        // acquire barrier.
        let my_ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        // Acquire pairs with the Release in `drop`, so we see every write
        // the previous holder made.
        while self.now_serving.load(Ordering::Acquire) != my_ticket {
            core::hint::spin_loop();
        }

        SpinLockGuard {
            lock: self,
            irq_was_enabled,
        }
    }

    /// Attempts to acquire the lock without spinning.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        let irq_was_enabled = irq::save_and_disable();

        let current = self.now_serving.load(Ordering::Relaxed);
        // Take the next ticket only if it is the one being served.
        let result = self.next_ticket.compare_exchange(
            current,
            current.wrapping_add(1),
            Ordering::Acquire,
            Ordering::Relaxed,
        );

        match result {
            Ok(_) => Some(SpinLockGuard {
                lock: self,
                irq_was_enabled,
            }),
            Err(_) => {
                irq::restore(irq_was_enabled);
                None
            }
        }
    }

    /// Whether some core currently holds (or is queued for) the lock.
    ///
    /// Only a snapshot; useful for assertions, never for synchronization.
    pub fn is_locked(&self) -> bool {
        self.next_ticket.load(Ordering::Relaxed) != self.now_serving.load(Ordering::Relaxed)
    }

    /// Returns a mutable reference to the underlying data.
    ///
    /// `&mut self` guarantees exclusive access at compile time, so no
    /// locking is needed.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

/// RAII guard for a held spinlock.
///
/// Dropping the guard releases the lock and restores the interrupt state,
/// on every exit path including early `?` returns.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
    irq_was_enabled: bool,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: We hold the lock, so we have exclusive access.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: We hold the lock, so we have exclusive access.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        // Release makes our writes visible before the next ticket is served.
        self.lock.now_serving.fetch_add(1, Ordering::Release);
        irq::restore(self.irq_was_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn try_lock_fails_while_held() {
        let lock = SpinLock::new(5);
        let guard = lock.lock();
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(!lock.is_locked());
        assert_eq!(*lock.try_lock().unwrap(), 5);
    }

    #[test]
    fn contended_increments_are_not_lost() {
        let lock = Arc::new(SpinLock::new(0u64));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let lock = Arc::clone(&lock);
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        *lock.lock() += 1;
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(*lock.lock(), 40_000);
    }
}
