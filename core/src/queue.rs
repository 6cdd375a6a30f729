//! queue.rs
//! Circular FIFO of pending work.
//!
//! Not thread-safe by itself: every access goes through the owner's lock
//! (session pending state, dispatcher completion queue). Locks are held only
//! for a single push/pop.

use crate::constants::QUEUE_GROWTH_STEP;

#[derive(Debug)]
pub struct JobQueue<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> Default for JobQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JobQueue<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), head: 0, len: 0 }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, head: 0, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Append at `(head + len) mod capacity`, growing first when full.
    pub fn push(&mut self, item: T) {
        if self.len == self.capacity() {
            self.grow();
        }
        let idx = (self.head + self.len) % self.capacity();
        debug_assert!(self.slots[idx].is_none());
        self.slots[idx] = Some(item);
        self.len += 1;
    }

    /// Remove the element at `head`; `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        item
    }

    /// Reallocate to `cap + cap/2 + QUEUE_GROWTH_STEP`, moving live elements
    /// (starting at `head`) to offset 0.
    fn grow(&mut self) {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity + old_capacity / 2 + QUEUE_GROWTH_STEP;

        let mut slots: Vec<Option<T>> = Vec::with_capacity(new_capacity);
        for i in 0..self.len {
            slots.push(self.slots[(self.head + i) % old_capacity].take());
        }
        slots.resize_with(new_capacity, || None);

        self.slots = slots;
        self.head = 0;
    }
}
