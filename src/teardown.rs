//! Session teardown signal.
//!
//! Every bounded wait in the session layer (connect wait, dock wait) races
//! against this signal.  Firing it wakes all pending waiters at once; once
//! fired it stays fired.

use core::cell::RefCell;
use core::future::poll_fn;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::Poll;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::waitqueue::MultiWakerRegistration;
use embassy_time::Timer;
use futures_lite::future;

use crate::app::events::MAX_SUBSCRIBERS;

/// Waiters parked on one teardown signal without spurious wakeups: one task
/// per event subscriber, plus the connect wait, a dock wait and two driver
/// tasks.
///
/// Past this bound `MultiWakerRegistration` wakes every parked waiter to make
/// room.  They re-check the flag and park again, so correctness holds but
/// each extra waiter costs a round of wakeups.
pub const MAX_WAITERS: usize = MAX_SUBSCRIBERS + 4;

pub struct Teardown {
    fired: AtomicBool,
    wakers: BlockingMutex<CriticalSectionRawMutex, RefCell<MultiWakerRegistration<MAX_WAITERS>>>,
}

impl Default for Teardown {
    fn default() -> Self {
        Self::new()
    }
}

impl Teardown {
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
            wakers: BlockingMutex::new(RefCell::new(MultiWakerRegistration::new())),
        }
    }

    /// Fire the signal and wake every waiter.  Idempotent.
    pub fn fire(&self) {
        self.fired.store(true, Ordering::Release);
        self.wakers.lock(|w| w.borrow_mut().wake());
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Resolve once the signal has fired.
    pub async fn wait(&self) {
        poll_fn(|cx| {
            if self.is_fired() {
                return Poll::Ready(());
            }
            self.wakers.lock(|w| w.borrow_mut().register(cx.waker()));
            // Re-check: `fire` may have run between the load and the register.
            if self.is_fired() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await;
    }

    /// Sleep for `period` unless torn down first.
    ///
    /// Returns `true` if the full period elapsed, `false` on teardown.
    pub async fn sleep(&self, period: Duration) -> bool {
        if self.is_fired() {
            return false;
        }
        future::or(
            async {
                Timer::after(to_embassy(period)).await;
                true
            },
            async {
                self.wait().await;
                false
            },
        )
        .await
    }
}

/// Convert a `core` duration to the `embassy-time` tick representation.
pub(crate) fn to_embassy(d: Duration) -> embassy_time::Duration {
    embassy_time::Duration::from_micros(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}
