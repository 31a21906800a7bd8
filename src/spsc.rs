//! Bounded lock-free single-producer/single-consumer queues.
//!
//! Every cross-thread hand-off in this crate (load requests, finished
//! sources, retirements) goes through one of these. Each logical channel
//! gets its own queue instance; a queue is never shared between two
//! producers or two consumers. That discipline is what makes the algorithm
//! correct, so it is enforced by the type system: [`channel`] returns a
//! [`Producer`]/[`Consumer`] pair, neither half is `Clone`, and both
//! `push` and `pop` take `&mut self`.
//!
//! `push` and `pop` are constant-time, never block, and never touch the
//! heap. A full queue rejects the push; an empty queue returns `None`.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Creates a bounded SPSC queue with room for `capacity` items.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn channel<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(capacity > 0, "queue capacity must be non-zero");

    let slots = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let ring = Arc::new(Ring {
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
        slots,
    });

    (Producer { ring: ring.clone() }, Consumer { ring })
}

/// Shared ring storage. `head` is the next slot to pop, `tail` the next
/// slot to push; both count monotonically and are reduced modulo the
/// capacity on slot access. Slots in `head..tail` are initialized.
struct Ring<T> {
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Pointer to the slot for a monotonic index.
    ///
    /// Safety: the caller must have exclusive access to that slot, i.e. be
    /// the producer writing an unoccupied slot or the consumer reading an
    /// occupied one.
    unsafe fn slot(&self, index: usize) -> *mut T {
        self.slots[index % self.capacity()].get().cast()
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Both halves are gone, so plain loads are fine.
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        for index in head..tail {
            unsafe { self.slot(index).drop_in_place() };
        }
    }
}

/// Write half of an SPSC queue. Owned by exactly one thread at a time.
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Producer<T> {
    /// Attempts to enqueue `value`. Returns `false` (and drops `value`)
    /// if the queue is full. Never blocks, never allocates.
    pub fn push(&mut self, value: T) -> bool {
        let tail = self.ring.tail.load(Ordering::Relaxed);
        let head = self.ring.head.load(Ordering::Acquire);
        if tail - head == self.ring.capacity() {
            return false;
        }
        unsafe { self.ring.slot(tail).write(value) };
        self.ring.tail.store(tail + 1, Ordering::Release);
        true
    }

    /// Number of items that can currently be pushed without failing.
    pub fn slots_to_write(&self) -> usize {
        let tail = self.ring.tail.load(Ordering::Relaxed);
        let head = self.ring.head.load(Ordering::Acquire);
        self.ring.capacity() - (tail - head)
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// Read half of an SPSC queue. Owned by exactly one thread at a time.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Consumer<T> {
    /// Attempts to dequeue the oldest item. Returns `None` if the queue is
    /// empty. Never blocks, never allocates.
    pub fn pop(&mut self) -> Option<T> {
        let head = self.ring.head.load(Ordering::Relaxed);
        let tail = self.ring.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let value = unsafe { self.ring.slot(head).read() };
        self.ring.head.store(head + 1, Ordering::Release);
        Some(value)
    }

    /// Number of items currently queued.
    pub fn slots_to_read(&self) -> usize {
        let head = self.ring.head.load(Ordering::Relaxed);
        let tail = self.ring.tail.load(Ordering::Acquire);
        tail - head
    }

    pub fn is_empty(&self) -> bool {
        self.slots_to_read() == 0
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let (mut tx, mut rx) = channel(8);
        for i in 0..8 {
            assert!(tx.push(i));
        }
        for i in 0..8 {
            assert_eq!(rx.pop(), Some(i));
        }
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_push_to_full_queue_fails_and_keeps_occupancy() {
        let (mut tx, rx) = channel(3);
        assert!(tx.push('a'));
        assert!(tx.push('b'));
        assert!(tx.push('c'));
        assert!(!tx.push('d'));
        assert_eq!(rx.slots_to_read(), 3);
        assert_eq!(tx.slots_to_write(), 0);
    }

    #[test]
    fn test_pop_from_empty_queue() {
        let (tx, mut rx) = channel::<u32>(4);
        assert_eq!(rx.pop(), None);
        assert_eq!(rx.slots_to_read(), 0);
        assert_eq!(tx.slots_to_write(), 4);
    }

    #[test]
    fn test_occupancy_tracks_push_and_pop() {
        let (mut tx, mut rx) = channel(4);
        assert!(tx.push(1));
        assert!(tx.push(2));
        assert_eq!(rx.slots_to_read(), 2);
        assert_eq!(tx.slots_to_write(), 2);
        assert_eq!(rx.pop(), Some(1));
        assert_eq!(rx.slots_to_read(), 1);
        assert_eq!(tx.slots_to_write(), 3);
    }

    #[test]
    fn test_wraps_around_past_capacity() {
        let (mut tx, mut rx) = channel(2);
        for round in 0..100 {
            assert!(tx.push(round));
            assert_eq!(rx.pop(), Some(round));
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn test_cross_thread_transfer_preserves_order() {
        let (mut tx, mut rx) = channel(16);
        let producer = thread::spawn(move || {
            let mut next = 0u64;
            while next < 10_000 {
                if tx.push(next) {
                    next += 1;
                } else {
                    thread::yield_now();
                }
            }
        });

        let mut expected = 0u64;
        while expected < 10_000 {
            match rx.pop() {
                Some(value) => {
                    assert_eq!(value, expected);
                    expected += 1;
                }
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();
    }

    #[test]
    fn test_pending_items_are_dropped_with_the_queue() {
        let probe = Arc::new(());
        let (mut tx, rx) = channel(4);
        assert!(tx.push(probe.clone()));
        assert!(tx.push(probe.clone()));
        assert_eq!(Arc::strong_count(&probe), 3);
        drop(tx);
        drop(rx);
        assert_eq!(Arc::strong_count(&probe), 1);
    }
}
