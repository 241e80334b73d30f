//! Bounded lock-free circular buffer.
//!
//! A fixed, power-of-two ring of slots addressed by two monotonically
//! increasing cursors: `end` (next slot to fill) and `start` (next slot to
//! drain). The slot for a cursor is `cursor & (capacity - 1)`.
//!
//! Each slot carries a stamp recording which lap of the ring it is ready for.
//! A producer may only claim slot `end` once its stamp equals `end` (the
//! previous occupant was taken), and a consumer may only claim slot `start`
//! once its stamp equals `start + 1` (the value was fully written). Claims are
//! made with a compare-exchange on the cursor, so any number of producers and
//! consumers can share one buffer; the engine uses it both as the
//! single-producer work queue and as the multi-producer free-buffer pool.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use super::SpinWait;

struct Slot<T> {
    stamp: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

pub struct CircularBuffer<T> {
    slots: Box<[Slot<T>]>,
    mask: usize,
    /// Next cursor to dequeue from
    start: CachePadded<AtomicUsize>,
    /// Next cursor to enqueue into
    end: CachePadded<AtomicUsize>,
    /// Items fully enqueued and not yet dequeued
    count: CachePadded<AtomicUsize>,
}

// SAFETY: a value is written by exactly one thread (the winner of the `end`
// claim) and read by exactly one thread (the winner of the `start` claim);
// the slot stamp's release/acquire pair orders the write before the read.
unsafe impl<T: Send> Send for CircularBuffer<T> {}
unsafe impl<T: Send> Sync for CircularBuffer<T> {}

impl<T> CircularBuffer<T> {
    /// Create a buffer holding at least `capacity` items.
    ///
    /// The capacity is rounded up to the next power of two, minimum two:
    /// with a single slot the stamps of a full and an empty ring coincide.
    pub fn new(capacity: usize) -> Self {
        let cap = capacity.max(2).next_power_of_two();
        let slots = (0..cap)
            .map(|i| Slot {
                stamp: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();
        Self {
            slots,
            mask: cap - 1,
            start: CachePadded::new(AtomicUsize::new(0)),
            end: CachePadded::new(AtomicUsize::new(0)),
            count: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of items currently queued.
    ///
    /// Exact only when no other thread is touching the buffer.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Try to append an item, handing it back if the buffer is full.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let mut end = self.end.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[end & self.mask];
            let stamp = slot.stamp.load(Ordering::Acquire);
            let lag = stamp.wrapping_sub(end) as isize;

            if lag == 0 {
                match self.end.compare_exchange_weak(
                    end,
                    end.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: winning the claim on `end` gives this thread
                        // exclusive access to the slot until the stamp is
                        // published below.
                        unsafe { (*slot.value.get()).write(value) };
                        slot.stamp.store(end.wrapping_add(1), Ordering::Release);
                        self.count.fetch_add(1, Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => end = current,
                }
            } else if lag < 0 {
                // The slot still holds an item from the previous lap.
                return Err(value);
            } else {
                end = self.end.load(Ordering::Relaxed);
            }
        }
    }

    /// Try to remove the oldest item.
    pub fn try_pop(&self) -> Option<T> {
        let mut start = self.start.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[start & self.mask];
            let stamp = slot.stamp.load(Ordering::Acquire);
            let lag = stamp.wrapping_sub(start.wrapping_add(1)) as isize;

            if lag == 0 {
                match self.start.compare_exchange_weak(
                    start,
                    start.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: the stamp says the value was published and
                        // winning the claim on `start` makes this the only
                        // reader of it.
                        let value = unsafe { (*slot.value.get()).assume_init_read() };
                        slot.stamp
                            .store(start.wrapping_add(self.capacity()), Ordering::Release);
                        self.count.fetch_sub(1, Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => start = current,
                }
            } else if lag < 0 {
                return None;
            } else {
                start = self.start.load(Ordering::Relaxed);
            }
        }
    }

    /// Append an item, spinning with back-off until there is room.
    pub fn push(&self, mut value: T) {
        let mut spinner = SpinWait::new();
        loop {
            match self.try_push(value) {
                Ok(()) => return,
                Err(v) => {
                    value = v;
                    spinner.spin_once();
                }
            }
        }
    }

    /// Remove the oldest item, spinning with back-off until one arrives.
    pub fn pop(&self) -> T {
        let mut spinner = SpinWait::new();
        loop {
            if let Some(v) = self.try_pop() {
                return v;
            }
            spinner.spin_once();
        }
    }

    /// Iterator that drains items until the buffer is observed empty.
    pub fn drain(&self) -> Drain<'_, T> {
        Drain { buffer: self }
    }
}

impl<T> Drop for CircularBuffer<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}

impl<T> fmt::Debug for CircularBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

pub struct Drain<'a, T> {
    buffer: &'a CircularBuffer<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.buffer.try_pop()
    }
}
