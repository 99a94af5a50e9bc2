//! Per-entity mutual exclusion consulted by `trigger`.

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;

/// Exclusive lock scoped to one entity.
///
/// Unlocking a lock that is not held must be harmless.
pub trait Locker: Send + Sync {
    fn lock(&self);

    fn unlock(&self);
}

/// Supplies the lock guarding a given entity identifier.
///
/// Two calls with the same identifier must return locks that exclude each
/// other; different identifiers must never contend.
pub trait LockerFactory: Send + Sync {
    fn locker(&self, entity_id: &str) -> Arc<dyn Locker>;
}

/// Holds a locker for the rest of a trigger call.
pub(crate) struct LockGuard {
    locker: Arc<dyn Locker>,
}

impl LockGuard {
    pub(crate) fn acquire(locker: Arc<dyn Locker>) -> Self {
        locker.lock();
        Self { locker }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.locker.unlock();
    }
}

/// Binary lock that can be released from any thread.
#[derive(Debug, Default)]
pub struct EntityLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl Locker for EntityLock {
    fn lock(&self) {
        let mut held = self.held.lock();
        while *held {
            self.released.wait(&mut held);
        }
        *held = true;
    }

    fn unlock(&self) {
        let mut held = self.held.lock();
        if *held {
            *held = false;
            self.released.notify_one();
        }
    }
}

type LockTable = Mutex<HashMap<String, Arc<EntityLock>>>;

/// Default factory handing out one [`EntityLock`] per entity identifier.
///
/// A lock lives in the table only while some handle to it is alive; the
/// last handle to drop removes it.
#[derive(Debug, Default)]
pub struct EntityLockers {
    locks: Arc<LockTable>,
}

impl EntityLockers {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities with a live lock handle.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// True when no entity lock is in use.
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

impl LockerFactory for EntityLockers {
    fn locker(&self, entity_id: &str) -> Arc<dyn Locker> {
        let lock = Arc::clone(self.locks.lock().entry(entity_id.to_string()).or_default());
        Arc::new(Lease {
            entity_id: entity_id.to_string(),
            lock,
            table: Arc::clone(&self.locks),
        })
    }
}

/// Handle to a table lock, evicting it from the table on last drop.
struct Lease {
    entity_id: String,
    lock: Arc<EntityLock>,
    table: Arc<LockTable>,
}

impl Locker for Lease {
    fn lock(&self) {
        self.lock.lock();
    }

    fn unlock(&self) {
        self.lock.unlock();
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut table = self.table.lock();
        // The table and this lease are the only owners left
        let idle = table
            .get(&self.entity_id)
            .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2);
        if idle {
            table.remove(&self.entity_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn handles_for_one_entity_share_a_lock() {
        let lockers = EntityLockers::new();
        let first = lockers.locker("o-1");
        let second = lockers.locker("o-1");
        let other = lockers.locker("o-2");
        assert_eq!(lockers.len(), 2);

        first.lock();
        let (tx, rx) = std::sync::mpsc::channel();
        let waiter = thread::spawn(move || {
            second.lock();
            let _ = tx.send(());
            second.unlock();
        });
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        other.lock();
        first.unlock();
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        waiter.join().unwrap();
        other.unlock();
    }

    #[test]
    fn idle_locks_are_evicted() {
        let lockers = EntityLockers::new();
        let first = lockers.locker("o-1");
        let second = lockers.locker("o-1");

        drop(first);
        assert_eq!(lockers.len(), 1);
        drop(second);
        assert!(lockers.is_empty());

        for i in 0..1_000 {
            let _guard = LockGuard::acquire(lockers.locker(&format!("o-{i}")));
        }
        assert!(lockers.is_empty());
    }

    #[test]
    fn unlock_without_lock_is_harmless() {
        let lock = EntityLock::default();
        lock.unlock();
        lock.lock();
        lock.unlock();
    }

    #[test]
    fn guard_excludes_concurrent_holders() {
        let lockers = Arc::new(EntityLockers::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lockers = Arc::clone(&lockers);
                let inside = Arc::clone(&inside);
                let overlaps = Arc::clone(&overlaps);
                thread::spawn(move || {
                    let _guard = LockGuard::acquire(lockers.locker("o-1"));
                    if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                        overlaps.fetch_add(1, Ordering::SeqCst);
                    }
                    thread::sleep(Duration::from_millis(2));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert!(lockers.is_empty());
    }
}
