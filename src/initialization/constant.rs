use super::WeightGen;

/// A weight generator that always generates the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstWeightGen {
    value: f64,
}

impl ConstWeightGen {
    /// Creates a new `ConstWeightGen` weight generator.
    ///
    /// # Arguments
    /// * `value` - The value to always generate.
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl WeightGen for ConstWeightGen {
    fn sample(&mut self) -> f64 {
        self.value
    }
}
