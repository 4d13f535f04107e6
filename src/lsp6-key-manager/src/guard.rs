//! Reentrancy guard around `execute` / `executeRelayCall`.
//!
//! The busy flag is held by a RAII guard, so it is released on every exit path.

use core::cell::Cell;

use stylus_sdk::storage::StorageBool;

/// A boolean flag the guard can flip.
pub trait ReentrancyLock {
    fn is_locked(&self) -> bool;
    fn set_locked(&mut self, locked: bool);
}

impl ReentrancyLock for &Cell<bool> {
    fn is_locked(&self) -> bool {
        self.get()
    }

    fn set_locked(&mut self, locked: bool) {
        self.set(locked)
    }
}

impl ReentrancyLock for &mut StorageBool {
    fn is_locked(&self) -> bool {
        self.get()
    }

    fn set_locked(&mut self, locked: bool) {
        self.set(locked)
    }
}

pub struct ReentrancyGuard<L: ReentrancyLock> {
    lock: L,
}

impl<L: ReentrancyLock> ReentrancyGuard<L> {
    /// Take the lock, or `None` if a call is already in progress.
    pub fn acquire(mut lock: L) -> Option<Self> {
        if lock.is_locked() {
            return None;
        }
        lock.set_locked(true);
        Some(Self { lock })
    }
}

impl<L: ReentrancyLock> Drop for ReentrancyGuard<L> {
    fn drop(&mut self) {
        self.lock.set_locked(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_acquire_fails_until_release() {
        let flag = Cell::new(false);
        {
            let _outer = ReentrancyGuard::acquire(&flag).unwrap();
            assert!(flag.get());
            assert!(ReentrancyGuard::acquire(&flag).is_none());
        }
        assert!(!flag.get());
        assert!(ReentrancyGuard::acquire(&flag).is_some());
    }

    #[test]
    fn released_on_early_return() {
        fn guarded(flag: &Cell<bool>) -> Result<(), ()> {
            let _guard = ReentrancyGuard::acquire(flag).ok_or(())?;
            Err(())
        }
        let flag = Cell::new(false);
        assert!(guarded(&flag).is_err());
        assert!(!flag.get());
    }
}
