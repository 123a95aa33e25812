//! Fixed-capacity delay lines for recurrent connections.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// FIFO of the last `len()` values a recurrent connection carried.
///
/// The value at the head is the one pushed exactly `len()` pushes ago; it is the
/// signal the connection delivers on the current step. Only the length is
/// serialized, and cloning produces a zeroed buffer of the same length, so
/// history never leaks into copies or checkpoints.
#[derive(Debug, Default)]
pub struct DelayBuffer {
    values: Vec<f32>,
    head: usize,
}

impl DelayBuffer {
    pub fn new(delay: usize) -> Self {
        Self {
            values: vec![0.0; delay],
            head: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value produced `len()` steps ago.
    #[inline]
    pub fn front(&self) -> f32 {
        self.values.get(self.head).copied().unwrap_or(0.0)
    }

    /// Enqueue at the tail and drop the head.
    #[inline]
    pub fn push(&mut self, value: f32) {
        if self.values.is_empty() {
            return;
        }
        self.values[self.head] = value;
        self.head = (self.head + 1) % self.values.len();
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        self.head = 0;
    }

    /// Contents from oldest to newest.
    pub fn to_vec(&self) -> Vec<f32> {
        let (newer, older) = self.values.split_at(self.head);
        older.iter().chain(newer.iter()).copied().collect()
    }

    /// Change the delay, keeping the most recent values.
    ///
    /// Shrinking drops the oldest entries; growing pads zeros on the old end,
    /// so newly exposed slots read as "nothing was sent yet".
    pub fn resize(&mut self, delay: usize) {
        let ordered = self.to_vec();
        let mut values = vec![0.0; delay];
        let keep = ordered.len().min(delay);
        values[delay - keep..].copy_from_slice(&ordered[ordered.len() - keep..]);
        self.values = values;
        self.head = 0;
    }
}

impl Clone for DelayBuffer {
    fn clone(&self) -> Self {
        Self::new(self.values.len())
    }
}

impl Serialize for DelayBuffer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.values.len() as u64)
    }
}

impl<'de> Deserialize<'de> for DelayBuffer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let len = u64::deserialize(deserializer)?;
        if len > u64::from(u32::MAX) {
            return Err(serde::de::Error::custom(format!("delay buffer length {} exceeds u32", len)));
        }
        Ok(DelayBuffer::new(len as usize))
    }
}
