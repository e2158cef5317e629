//! Limited buffer implementation.

/// Buffer limited by elements count.
/// Holds a single chunk of input items while it is being collected and sorted.
pub struct LimitedBuffer<T> {
    limit: usize,
    inner: Vec<T>,
}

impl<T> LimitedBuffer<T> {
    /// Creates an empty buffer that reports itself full once `limit` items are pushed.
    pub fn new(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            inner: Vec::new(),
        }
    }

    /// Same as [`LimitedBuffer::new`] but preallocates memory for `limit` items.
    pub fn with_capacity(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            inner: Vec::with_capacity(limit),
        }
    }

    /// Adds a new element to the buffer.
    pub fn push(&mut self, item: T) {
        self.inner.push(item);
    }

    /// Returns buffer length
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Checks if the buffer reached the limit.
    pub fn is_full(&self) -> bool {
        self.inner.len() >= self.limit
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Removes all items from the buffer keeping the allocated memory for the next chunk.
    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.inner.drain(..)
    }
}

impl<T: Ord> LimitedBuffer<T> {
    /// Sorts buffered items in ascending order.
    pub fn sort(&mut self) {
        self.inner.sort_unstable();
    }
}

impl<T> IntoIterator for LimitedBuffer<T> {
    type Item = T;
    type IntoIter = <Vec<T> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
