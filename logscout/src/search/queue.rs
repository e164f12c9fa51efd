use parking_lot::Mutex;
use std::collections::VecDeque;

/// A mutex-protected FIFO.
///
/// `pop` never blocks waiting for work: scanners treat an empty queue as the
/// signal to stop, so there is nothing to wait for.
#[derive(Debug)]
pub struct SafeQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> SafeQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
    }

    /// Appends every item, keeping their order
    pub fn extend<I: IntoIterator<Item = T>>(&self, items: I) {
        self.items.lock().extend(items);
    }

    /// Removes the oldest item, or `None` when the queue is empty
    pub fn pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

impl<T> Default for SafeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
