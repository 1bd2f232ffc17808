use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::ai::Transition;

/// Fixed-capacity ring buffer for storing training transitions.
///
/// Once full, each push overwrites the oldest entry, so eviction order is
/// insertion order and the length never exceeds the capacity.
pub struct ReplayBuffer<T = Transition> {
    buffer: Vec<T>,
    capacity: usize,
    position: usize,
    rng: StdRng,
}

impl<T: Clone> ReplayBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "replay capacity must be > 0");
        ReplayBuffer {
            buffer: Vec::with_capacity(capacity.min(4096)),
            capacity,
            position: 0,
            rng,
        }
    }

    /// Append an item. Overwrites the oldest when full.
    pub fn push(&mut self, item: T) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(item);
        } else {
            self.buffer[self.position] = item;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Sample `batch_size` distinct items uniformly at random, or `None`
    /// while fewer than `batch_size` are stored.
    pub fn sample(&mut self, batch_size: usize) -> Option<Vec<T>> {
        if batch_size > self.buffer.len() {
            return None;
        }
        let indices = index::sample(&mut self.rng, self.buffer.len(), batch_size);
        Some(indices.iter().map(|i| self.buffer[i].clone()).collect())
    }

    /// Items from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let split = if self.buffer.len() < self.capacity {
            0
        } else {
            self.position
        };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
