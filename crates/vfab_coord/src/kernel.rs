//! The event-kernel seam.

use vfab_common::SimTime;

/// The discrete-event kernel as the coordinator sees it.
///
/// The coordinator never blocks. Whenever it needs to be revisited it
/// schedules an event, and the kernel hands that event back at the requested
/// simulated time.
pub trait EventKernel<E> {
    /// Returns the current simulated time.
    fn now(&self) -> SimTime;

    /// Schedules `event` to fire `delay` after [`now`](Self::now).
    fn schedule_at(&mut self, delay: SimTime, event: E);
}
