//! Bounded FIFO ring for drill-down mirrors (recent batches, recent rejections).

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Fixed-capacity buffer; the oldest item is evicted once full. Appends are
/// serialized by the internal lock, so concurrent writers never reorder or
/// over-evict.
#[derive(Debug)]
pub struct RingBuffer<T> {
  capacity: usize,
  items: Mutex<VecDeque<T>>,
}

impl<T: Clone> RingBuffer<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      items: Mutex::new(VecDeque::with_capacity(capacity)),
    }
  }

  pub fn push(&self, item: T) {
    self.extend(std::iter::once(item));
  }

  /// Append several items under one lock acquisition.
  pub fn extend(&self, items: impl IntoIterator<Item = T>) {
    if self.capacity == 0 {
      return;
    }
    let mut guard = self.items.lock();
    for item in items {
      if guard.len() == self.capacity {
        guard.pop_front();
      }
      guard.push_back(item);
    }
  }

  /// Oldest first.
  pub fn snapshot(&self) -> Vec<T> {
    self.items.lock().iter().cloned().collect()
  }

  /// Up to `limit` items, newest first.
  pub fn latest(&self, limit: usize) -> Vec<T> {
    self.items.lock().iter().rev().take(limit).cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.items.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
