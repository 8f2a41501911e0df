use std::collections::VecDeque;

/// Fixed-capacity rolling buffer, newest value at shift 0.
///
/// Mirrors the `buffer[shift]` access pattern of the MetaTrader sources:
/// `get(0)` is the current bar, `get(1)` the previous one and so on.
#[derive(Debug, Clone)]
pub struct History<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> History<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.buf.len() == self.capacity {
            self.buf.pop_back();
        }
        self.buf.push_front(value);
    }

    pub fn get(&self, shift: usize) -> Option<T> {
        self.buf.get(shift).copied()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Iterate from newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_shift_order_and_capacity() {
        let mut h = History::new(3);
        for v in 1..=5 {
            h.push(v);
        }
        assert!(h.is_full());
        assert_eq!(h.get(0), Some(5));
        assert_eq!(h.get(1), Some(4));
        assert_eq!(h.get(2), Some(3));
        assert_eq!(h.get(3), None);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![5, 4, 3]);
    }
}
