//! Random Source Adapters

use parking_lot::Mutex;
use rand::Rng;

/// Uniform samples in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// Production source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandomSource;

impl RandomSource for ThreadRandomSource {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic source cycling through a fixed list.
///
/// ```rust
/// use hmi_03_simulator::{RandomSource, SequenceRandomSource};
///
/// let rng = SequenceRandomSource::new(vec![0.25, 0.75]);
/// assert_eq!(rng.next_unit(), 0.25);
/// assert_eq!(rng.next_unit(), 0.75);
/// assert_eq!(rng.next_unit(), 0.25);
/// ```
#[derive(Debug)]
pub struct SequenceRandomSource {
    values: Vec<f64>,
    cursor: Mutex<usize>,
}

impl SequenceRandomSource {
    /// Values are clamped into `[0, 1)`; an empty list behaves like `[0.5]`.
    pub fn new(values: Vec<f64>) -> Self {
        let values = if values.is_empty() {
            vec![0.5]
        } else {
            values
                .into_iter()
                .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
                .collect()
        };
        Self {
            values,
            cursor: Mutex::new(0),
        }
    }

    /// Always the midpoint, which makes every walk stand still.
    pub fn neutral() -> Self {
        Self::new(vec![0.5])
    }
}

impl RandomSource for SequenceRandomSource {
    fn next_unit(&self) -> f64 {
        let mut cursor = self.cursor.lock();
        let value = self.values[*cursor % self.values.len()];
        *cursor = cursor.wrapping_add(1);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_source_in_range() {
        let rng = ThreadRandomSource;
        for _ in 0..1000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_sequence_clamps_and_defaults() {
        let rng = SequenceRandomSource::new(vec![-1.0, 2.0]);
        assert_eq!(rng.next_unit(), 0.0);
        assert!(rng.next_unit() < 1.0);
        assert_eq!(SequenceRandomSource::new(Vec::new()).next_unit(), 0.5);
    }
}
