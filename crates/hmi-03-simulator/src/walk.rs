//! Bounded random walk.

/// `next = clamp(current + uniform(-delta, +delta), min, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomWalk {
    pub min: f64,
    pub max: f64,
    pub delta: f64,
}

impl RandomWalk {
    pub const fn new(min: f64, max: f64, delta: f64) -> Self {
        Self { min, max, delta }
    }

    /// One step driven by `unit`, a sample in `[0, 1)`. A `unit` of 0.5
    /// leaves the value unchanged apart from clamping.
    pub fn step(&self, current: f64, unit: f64) -> f64 {
        let start = if current.is_finite() { current } else { self.min };
        (start + (unit - 0.5) * 2.0 * self.delta).clamp(self.min, self.max)
    }
}
