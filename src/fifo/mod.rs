//! A first-in-first-out queue behind a single mutex.
//!
//! Every operation takes the lock exactly once for its whole duration, so each
//! call is atomic with respect to every other call on the same queue. Besides
//! plain insertion the queue offers a duplicate-suppressing insertion, which
//! treats the queue as an ordered set: a value is only appended when no equal
//! value is currently queued.

mod error;
mod handle;

use std::{
    collections::VecDeque,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

pub use error::QueueError;
pub use handle::{FifoHandle, UniqueFifoHandle};

struct State<T> {
    items: VecDeque<T>,
    // cached length, always equal to items.len()
    count: usize,
    // never decremented
    total_inserted: usize,
}

impl<T> State<T> {
    fn push_back(&mut self, item: T) {
        self.items.push_back(item);
        self.count += 1;
        self.total_inserted += 1;
        debug_assert_eq!(self.count, self.items.len());
    }

    fn pop_front(&mut self) -> Result<T, QueueError> {
        let item = self.items.pop_front().ok_or(QueueError::Empty)?;
        self.count -= 1;
        debug_assert_eq!(self.count, self.items.len());
        Ok(item)
    }
}

impl<T: PartialEq> State<T> {
    fn contains(&self, item: &T) -> bool {
        self.count != 0 && self.items.iter().any(|queued| queued == item)
    }

    fn push_back_unique(&mut self, item: T) -> bool {
        if self.contains(&item) {
            return false;
        }
        self.push_back(item);
        true
    }
}

// Undoes a partially appended batch when the caller's iterator or `PartialEq`
// panics, so a batch is either fully queued or not queued at all.
struct Batch<'a, T> {
    state: &'a mut State<T>,
    start_count: usize,
    start_total: usize,
    committed: bool,
}

impl<'a, T> Batch<'a, T> {
    fn begin(state: &'a mut State<T>) -> Self {
        Self {
            start_count: state.count,
            start_total: state.total_inserted,
            state,
            committed: false,
        }
    }

    /// Keeps the appended items and returns how many there were.
    fn commit(mut self) -> usize {
        self.committed = true;
        self.state.count - self.start_count
    }
}

impl<T> Drop for Batch<'_, T> {
    fn drop(&mut self) {
        if !self.committed {
            self.state.items.truncate(self.start_count);
            self.state.count = self.start_count;
            self.state.total_inserted = self.start_total;
        }
    }
}

/// Thread-safe FIFO queue. Share it by reference (e.g. with `std::thread::scope`)
/// or wrap it in an `Arc`.
pub struct FifoQueue<T> {
    state: Mutex<State<T>>,
}

impl<T> FifoQueue<T> {
    /// Creates an empty queue without preallocated storage.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty queue with room for `capacity_hint` elements before it has
    /// to reallocate. A hint of zero or less means no preallocation. The hint never
    /// bounds the queue.
    pub fn with_capacity(capacity_hint: isize) -> Self {
        let mut items = VecDeque::new();
        if let Ok(capacity) = usize::try_from(capacity_hint) {
            // too large to preallocate is not an error, the queue just grows on demand
            let _ = items.try_reserve(capacity);
        }
        Self {
            state: Mutex::new(State {
                items,
                count: 0,
                total_inserted: 0,
            }),
        }
    }

    // Counters are updated together with the storage and batches roll back on
    // panic, so the state behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` at the back of the queue.
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
    }

    /// Appends every item in order, without letting other operations interleave.
    /// Returns the number of appended items.
    pub fn extend<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut state = self.lock();
        let mut batch = Batch::begin(&mut state);
        for item in items {
            batch.state.push_back(item);
        }
        batch.commit()
    }

    /// Removes and returns the oldest element.
    pub fn pop(&self) -> Result<T, QueueError> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.lock().count == 0
    }

    /// Number of elements ever accepted by the queue, including those already
    /// removed.
    pub fn total_inserted(&self) -> usize {
        self.lock().total_inserted
    }

    /// Removes every queued element and returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let removed = state.count;
        state.items.clear();
        state.count = 0;
        removed
    }

    /// Consumes the queue, returning the remaining elements oldest first.
    pub fn into_vec(self) -> Vec<T> {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        state.items.into()
    }
}

impl<T: Clone> FifoQueue<T> {
    /// Returns a copy of the oldest element without removing it.
    pub fn peek(&self) -> Result<T, QueueError> {
        self.lock().items.front().cloned().ok_or(QueueError::Empty)
    }

    /// Copies the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().items.iter().cloned().collect()
    }
}

impl<T: PartialEq> FifoQueue<T> {
    /// Appends `item` unless an equal element is already queued. The check and the
    /// append happen under the same lock acquisition. Returns whether `item` was
    /// appended.
    pub fn push_unique(&self, item: T) -> bool {
        self.lock().push_back_unique(item)
    }

    /// Appends `items` in order as one atomic step. With `unique`, each item is
    /// checked against the queue as it stands after the items before it were
    /// considered, so repeated values within `items` are kept once. Returns the
    /// number of appended items.
    pub fn push_many<I>(&self, items: I, unique: bool) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        if !unique {
            return self.extend(items);
        }
        let mut state = self.lock();
        let mut batch = Batch::begin(&mut state);
        for item in items {
            batch.state.push_back_unique(item);
        }
        batch.commit()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.lock().contains(item)
    }
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FifoQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("FifoQueue")
            .field("len", &state.count)
            .field("total_inserted", &state.total_inserted)
            .finish()
    }
}
