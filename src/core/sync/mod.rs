/*!
 * Synchronization Primitives
 *
 * The kernel runs every system call under one global `parking_lot::Mutex`.
 * Blocking is expressed only through `CondVar`, which atomically releases
 * that lock while the calling thread sleeps and re-acquires it on wake.
 *
 * Wakes are Mesa-style: a broadcast wakes every waiter and an earlier waiter
 * may already have consumed what the signal announced. Every wait must sit
 * inside a loop that re-tests its predicate.
 */

mod condvar;

pub use condvar::CondVar;
