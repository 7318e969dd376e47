//! Counting semaphore over a parking_lot mutex and condvar.

use parking_lot::{Condvar, Mutex};

/// Minimal counting semaphore.
///
/// Just acquire and release; no try-variants, no timeouts. The frame
/// baton never needs them, and their absence keeps every wait visible as
/// a real ordering point.
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// A semaphore holding `permits` initial permits.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Semaphore { permits: Mutex::new(permits), available: Condvar::new() }
    }

    /// Blocks until a permit is available, then takes it.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Returns one permit, waking a blocked acquirer if any.
    pub fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn initial_permits_are_consumable_without_blocking() {
        let sem = Semaphore::new(2);
        sem.acquire();
        sem.acquire();
        sem.release();
        sem.acquire();
    }

    #[test]
    fn acquire_blocks_until_release() {
        let sem = Arc::new(Semaphore::new(0));
        let waiter = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || {
                sem.acquire();
                42
            })
        };
        sem.release();
        assert_eq!(waiter.join().ok(), Some(42));
    }
}
