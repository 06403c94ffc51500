use crate::{ConcurrentQueue, Handle};

use super::FifoQueue;

/// Handle whose enqueues always append.
pub struct FifoHandle<'q, T> {
    queue: &'q FifoQueue<T>,
}

impl<T> Handle<T> for FifoHandle<'_, T> {
    fn enqueue(&mut self, item: T) {
        self.queue.push(item);
    }

    fn dequeue(&mut self) -> Option<T> {
        self.queue.pop().ok()
    }
}

/// Handle whose enqueues skip values that are already queued.
pub struct UniqueFifoHandle<'q, T> {
    queue: &'q FifoQueue<T>,
}

impl<T: PartialEq> Handle<T> for UniqueFifoHandle<'_, T> {
    fn enqueue(&mut self, item: T) {
        self.queue.push_unique(item);
    }

    fn dequeue(&mut self) -> Option<T> {
        self.queue.pop().ok()
    }
}

impl<T> ConcurrentQueue<T> for FifoQueue<T> {
    fn register(&self) -> impl Handle<T> {
        FifoHandle { queue: self }
    }
}

impl<T: PartialEq> FifoQueue<T> {
    pub fn register_unique(&self) -> UniqueFifoHandle<'_, T> {
        UniqueFifoHandle { queue: self }
    }
}
