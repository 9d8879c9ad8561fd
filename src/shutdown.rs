//! One-way cancellation latch for the producer tasks.
//!
//! Producers race their whole loop against [`ShutdownLatch::wait`]. When the
//! latch trips, the losing future is dropped on the spot: whatever bus
//! transaction or sleep it was in is abandoned and never joined.

use core::cell::RefCell;
use core::future::{poll_fn, Future};
use core::task::Poll;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

struct LatchState<const N: usize> {
    tripped: bool,
    waiters: MultiWakerRegistration<N>,
}

/// Multi-waiter latch; `N` is the number of tasks that may wait on it.
pub struct ShutdownLatch<M: RawMutex, const N: usize> {
    state: Mutex<M, RefCell<LatchState<N>>>,
}

impl<M: RawMutex, const N: usize> ShutdownLatch<M, N> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(LatchState {
                tripped: false,
                waiters: MultiWakerRegistration::new(),
            })),
        }
    }

    /// Trip the latch and wake every waiter. Cannot be undone.
    pub fn trip(&self) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.tripped = true;
            s.waiters.wake();
        });
    }

    pub fn is_tripped(&self) -> bool {
        self.state.lock(|s| s.borrow().tripped)
    }

    /// Resolves once the latch has tripped.
    pub async fn wait(&self) {
        poll_fn(|cx| {
            self.state.lock(|s| {
                let mut s = s.borrow_mut();
                if s.tripped {
                    Poll::Ready(())
                } else {
                    s.waiters.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }

    /// Run `work` until it finishes or the latch trips, whichever comes first.
    ///
    /// Returns `None` when the work was abandoned.
    pub async fn guard<F: Future>(&self, work: F) -> Option<F::Output> {
        // Latch is polled first so an already-tripped latch never starts the work.
        match select(self.wait(), work).await {
            Either::First(()) => None,
            Either::Second(out) => Some(out),
        }
    }
}

impl<M: RawMutex, const N: usize> Default for ShutdownLatch<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
