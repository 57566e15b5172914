//! Fixed-capacity delay line.
//!
//! `DelayBuffer` delays a signal by `gamma` insertions: the value returned by
//! the n-th `insert` is the value passed to insert n − gamma, or 0.0 while
//! fewer than gamma values have been seen. A zero-capacity buffer passes
//! every value straight through.

/// A FIFO shift register of capacity `gamma` backed by a ring buffer.
#[derive(Debug, Clone)]
pub struct DelayBuffer {
    slots: Vec<f64>,
    /// Index of the oldest value.
    head: usize,
    /// Number of values currently held.
    len: usize,
}

impl DelayBuffer {
    pub fn new(gamma: usize) -> Self {
        Self {
            slots: vec![0.0; gamma],
            head: 0,
            len: 0,
        }
    }

    /// Push `x` and return the value that entered `gamma` insertions ago.
    pub fn insert(&mut self, x: f64) -> f64 {
        let gamma = self.slots.len();
        if gamma == 0 {
            return x;
        }

        if self.len < gamma {
            let tail = (self.head + self.len) % gamma;
            self.slots[tail] = x;
            self.len += 1;
            return 0.0;
        }

        // Full: the oldest slot is overwritten in place and the head advances.
        let oldest = std::mem::replace(&mut self.slots[self.head], x);
        self.head = (self.head + 1) % gamma;
        oldest
    }

    /// Held values oldest first, once the buffer is warm.
    pub fn snapshot(&self) -> Option<Vec<f64>> {
        if !self.is_warm() {
            return None;
        }
        Some(self.iter().collect())
    }

    fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let gamma = self.slots.len();
        (0..self.len).map(move |i| self.slots[(self.head + i) % gamma])
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once `capacity()` values have been inserted.
    pub fn is_warm(&self) -> bool {
        self.len == self.slots.len()
    }
}
