//! Rolling buffer for one axis of the motion signal.

use fixed_deque::Deque;

use crate::error::SignalError;

/// Holds at most `capacity` of the most recent values, oldest first.
pub struct SampleWindow {
    values: Deque<f32>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        SampleWindow {
            values: Deque::new(capacity),
            capacity,
        }
    }

    /// Appends a value, evicting the oldest one when the window is full.
    pub fn push(&mut self, value: f32) {
        self.values.push_back(value);
    }

    /// Arithmetic mean of the current contents. No mean, and so no decision, before
    /// the first push.
    pub fn mean(&self) -> Result<f32, SignalError> {
        match self.values.len() {
            0 => Err(SignalError::EmptyWindow),
            len => Ok(self.sum() / len as f32),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    fn sum(&self) -> f32 {
        self.values.iter().sum::<f32>()
    }
}
