//! Array-backed binary min-heap keyed by a score extractor.

use std::fmt;

/// Binary min-heap ordering elements by the score returned from `score`.
///
/// Elements with equal scores come out in an unspecified but deterministic
/// order: the same sequence of pushes and pops always yields the same result.
pub struct MinHeap<T, F> {
    items: Vec<T>,
    score: F,
}

impl<T, F> MinHeap<T, F>
where
    F: Fn(&T) -> f32,
{
    /// Creates an empty heap.
    pub fn new(score: F) -> Self {
        Self {
            items: Vec::new(),
            score,
        }
    }

    /// Inserts `item`.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.bubble_up(self.items.len() - 1);
    }

    /// Removes and returns the element with the lowest score.
    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let top = self.items.pop();
        if !self.items.is_empty() {
            self.bubble_down(0);
        }
        top
    }

    /// Element with the lowest score, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Number of stored elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Reports whether the heap holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes every element, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn bubble_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if (self.score)(&self.items[index]) >= (self.score)(&self.items[parent]) {
                break;
            }
            self.items.swap(index, parent);
            index = parent;
        }
    }

    fn bubble_down(&mut self, mut index: usize) {
        let len = self.items.len();
        loop {
            let left = index * 2 + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < len && (self.score)(&self.items[left]) < (self.score)(&self.items[smallest]) {
                smallest = left;
            }
            if right < len && (self.score)(&self.items[right]) < (self.score)(&self.items[smallest])
            {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.items.swap(index, smallest);
            index = smallest;
        }
    }
}

impl<T, F> fmt::Debug for MinHeap<T, F>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinHeap")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}
