use std::collections::VecDeque;

use serde::Serialize;

/// Sliding window of the most recent `max_len` entries.
///
/// Appends go to the tail and eviction happens from the head, one entry at a
/// time, immediately after every push. The observable length never exceeds
/// the cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundedSeries<T> {
    values: VecDeque<T>,
    max_len: usize,
}

impl<T> BoundedSeries<T> {
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            values: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    /// Append at the tail; returns the evicted head if the cap was exceeded.
    pub fn push(&mut self, value: T) -> Option<T> {
        self.values.push_back(value);
        if self.values.len() > self.max_len {
            self.values.pop_front()
        } else {
            None
        }
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) -> usize {
        let mut evicted = 0;
        for v in values {
            if self.push(v).is_some() {
                evicted += 1;
            }
        }
        evicted
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_len
    }

    pub fn first(&self) -> Option<&T> {
        self.values.front()
    }

    pub fn last(&self) -> Option<&T> {
        self.values.back()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<T: Clone> BoundedSeries<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.values.iter().cloned().collect()
    }
}
