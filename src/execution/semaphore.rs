use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A small, blocking counting semaphore bounding in-flight requests.
pub(crate) struct Semaphore {
    permits: Mutex<usize>,
    cv: Condvar,
}

/// A held permit; released on drop.
pub(crate) struct Permit<'a> {
    sem: &'a Semaphore,
    /// Time spent blocked before the permit was granted.
    pub(crate) waited: Duration,
}

impl Semaphore {
    pub(crate) fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits.max(1)),
            cv: Condvar::new(),
        }
    }

    /// Block until a permit is available.
    pub(crate) fn acquire(&self) -> Permit<'_> {
        let start = Instant::now();
        let mut blocked = false;
        // The guarded counter stays consistent even if a holder panicked.
        let mut g = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
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
        let mut g = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        *g += 1;
        self.cv.notify_one();
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
    fn permit_is_returned_on_drop() {
        let sem = Semaphore::new(1);
        let first = sem.acquire();
        assert_eq!(first.waited, Duration::ZERO);
        drop(first);
        let second = sem.acquire();
        assert_eq!(second.waited, Duration::ZERO);
    }
}
