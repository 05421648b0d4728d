use std::collections::VecDeque;

/// Fixed-capacity rolling buffer of raw samples for one channel.
///
/// Once `capacity` samples have been pushed the buffer stays full: every new
/// sample evicts the oldest one.
#[derive(Debug, Clone)]
pub struct ChannelBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl ChannelBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.samples.len() == self.capacity
    }

    /// Current contents, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_then_evicts_oldest() {
        let mut buffer = ChannelBuffer::new(3);
        buffer.push(1.0);
        buffer.push(2.0);
        assert!(!buffer.is_full());
        buffer.push(3.0);
        assert!(buffer.is_full());
        buffer.push(4.0);
        assert!(buffer.is_full());
        assert_eq!(buffer.snapshot(), vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut buffer = ChannelBuffer::new(2);
        buffer.push(5.0);
        let first = buffer.snapshot();
        let second = buffer.snapshot();
        assert_eq!(first, second);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_zero_capacity_never_fills() {
        let mut buffer = ChannelBuffer::new(0);
        buffer.push(1.0);
        assert!(!buffer.is_full());
        assert!(buffer.is_empty());
    }
}
