pub mod fifo;

pub use fifo::{FifoQueue, QueueError};

pub trait ConcurrentQueue<T> {
    /// Returns a thread handle to the queue, which can be used for enqueues and dequeues
    fn register(&self) -> impl Handle<T>;
}

pub trait Handle<T> {
    fn enqueue(&mut self, item: T);

    /// Returns `None` when the queue is empty at the time of the call.
    fn dequeue(&mut self) -> Option<T>;
}
