//! Bounded, non-blocking inter-thread queue.
//!
//! A fixed-capacity ring buffer behind a single mutex. Both pumps are
//! drain-on-wake loops, so the queue never blocks: `push` fails immediately
//! when full (the caller owns the back-pressure decision) and `pop` returns
//! `None` immediately when empty (waiting for data is the caller's event
//! loop's job).
//!
//! One slot is always left unused so that `head == tail` unambiguously means
//! empty; a queue created with capacity `n` therefore holds `n - 1` items.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Default capacity for each direction of the bridge, in slots.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Error returned by [`Queue::push`] when the ring is full.
///
/// Carries the rejected item back to the caller, which must decide whether
/// to retry, report, or deliberately discard it. A full queue is the single
/// back-pressure signal in the bridge; it must never be ignored silently.
pub struct QueueFull<T>(pub T);

impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueFull(..)")
    }
}

impl<T> fmt::Display for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is full")
    }
}

impl<T> std::error::Error for QueueFull<T> {}

struct Ring<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
}

/// Fixed-capacity FIFO queue shared between the two threads.
///
/// FIFO order is preserved across concurrent `push`/`pop` from different
/// threads. The queue stores messages by value and never interprets them;
/// in particular it never disposes of an engine value — an undelivered
/// [`ValueHandle`](crate::value::ValueHandle) left in a dropped queue is a
/// leak by design, not a cross-thread free.
pub struct Queue<T> {
    inner: Mutex<Ring<T>>,
}

impl<T> Queue<T> {
    /// Create a queue with `capacity` slots (minimum 2; one slot is
    /// reserved, so the queue holds `capacity - 1` items).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            inner: Mutex::new(Ring {
                slots,
                head: 0,
                tail: 0,
            }),
        }
    }

    /// Create a queue with [`DEFAULT_QUEUE_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Ring<T>> {
        // A panicked peer must not wedge the survivor; ring indices are
        // updated only after the slot write, so the state is usable as-is.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item. Never blocks: returns the item inside
    /// [`QueueFull`] if no slot is free.
    pub fn push(&self, item: T) -> Result<(), QueueFull<T>> {
        let mut ring = self.lock();
        let next = (ring.tail + 1) % ring.slots.len();
        if next == ring.head {
            return Err(QueueFull(item));
        }
        let tail = ring.tail;
        ring.slots[tail] = Some(item);
        ring.tail = next;
        Ok(())
    }

    /// Remove and return the oldest item. Never blocks: returns `None` if
    /// the queue is empty.
    pub fn pop(&self) -> Option<T> {
        let mut ring = self.lock();
        if ring.head == ring.tail {
            return None;
        }
        let head = ring.head;
        let item = ring.slots[head].take();
        ring.head = (head + 1) % ring.slots.len();
        // A populated region never contains an empty slot.
        debug_assert!(item.is_some());
        item
    }

    /// Point-in-time emptiness snapshot.
    ///
    /// Advisory only: another thread may push or pop between this check and
    /// any following call. Never use it to pre-flight a `push` or `pop`;
    /// call them directly and branch on the result.
    pub fn is_empty(&self) -> bool {
        let ring = self.lock();
        ring.head == ring.tail
    }

    /// Number of items the queue can hold (`slots - 1`).
    pub fn capacity(&self) -> usize {
        self.lock().slots.len() - 1
    }

    /// Point-in-time item count. Advisory only, like [`Queue::is_empty`].
    pub fn len(&self) -> usize {
        let ring = self.lock();
        let n = ring.slots.len();
        (ring.tail + n - ring.head) % n
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}
