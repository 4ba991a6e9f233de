use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A small, blocking counting semaphore bounding how many chunks run at once.
///
/// Permits are returned when the [`Permit`] guard drops, so a panicking leaf cannot leak one.
pub(crate) struct Semaphore {
    permits: Mutex<usize>,
    cv: Condvar,
}

/// An acquired permit; released on drop.
pub(crate) struct Permit<'a> {
    sem: &'a Semaphore,
    /// Time spent blocked before the permit was granted.
    pub(crate) waited: Duration,
}

impl Semaphore {
    pub(crate) fn new(permits: usize) -> Self {
        assert!(permits > 0, "permits must be > 0");
        Self {
            permits: Mutex::new(permits),
            cv: Condvar::new(),
        }
    }

    /// Acquire one permit, blocking until available.
    pub(crate) fn acquire(&self) -> Permit<'_> {
        let start = Instant::now();
        let mut blocked = false;
        let mut g = self.lock();
        while *g == 0 {
            blocked = true;
            g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
        *g -= 1;
        Permit {
            sem: self,
            waited: if blocked { start.elapsed() } else { Duration::ZERO },
        }
    }

    fn release(&self) {
        let mut g = self.lock();
        *g += 1;
        self.cv.notify_one();
    }

    // The counter stays consistent under poisoning: it is only touched while locked.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}

#[cfg(test)]
mod tests {
    use super::Semaphore;
    use std::time::Duration;

    #[test]
    fn permits_are_returned_on_drop() {
        let sem = Semaphore::new(1);
        {
            let p = sem.acquire();
            assert_eq!(p.waited, Duration::ZERO);
        }
        let p = sem.acquire();
        assert_eq!(p.waited, Duration::ZERO);
    }

    #[test]
    #[should_panic(expected = "permits must be > 0")]
    fn zero_permits_panics() {
        let _ = Semaphore::new(0);
    }
}
