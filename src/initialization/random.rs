use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::{RandErr, Result, WeightGen};

/// A weight generator that follows a certain probabilistic distribution.
///
/// Owns its random number generator, so a seeded generator produces the same stream of
/// weights on every run.
pub struct RandWeightGen<R: Rng, D: Distribution<f64>> {
    rng: R,
    distribution: D,
}

impl<R: Rng, D: Distribution<f64>> RandWeightGen<R, D> {
    /// Creates a new `RandWeightGen` weight generator.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `distribution` - The distribution to sample the random numbers from.
    pub fn new(rng: R, distribution: D) -> Self {
        Self { rng, distribution }
    }
}

impl<R: Rng> RandWeightGen<R, Uniform<f64>> {
    /// Creates a new `RandWeightGen` weight generator with a uniform distribution.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `low` - The inclusive lower limit.
    /// * `high` - The exclusive upper limit.
    ///
    /// # Returns
    /// An error if the range is invalid (low >= high).
    pub fn uniform(rng: R, low: f64, high: f64) -> Result<Self> {
        let distribution = Uniform::new(low, high).map_err(|e| RandErr::Uniform {
            low,
            high,
            reason: e.to_string(),
        })?;

        Ok(Self::new(rng, distribution))
    }
}

impl<R: Rng> RandWeightGen<R, Normal<f64>> {
    /// Creates a new `RandWeightGen` weight generator with a normal distribution.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `mean` - The mean of the distribution.
    /// * `std_dev` - The standard deviation of the distribution.
    ///
    /// # Returns
    /// An error if `std_dev` is not finite (Nan or infinite).
    pub fn normal(rng: R, mean: f64, std_dev: f64) -> Result<Self> {
        let distribution = Normal::new(mean, std_dev).map_err(|e| RandErr::Normal {
            mean,
            std_dev,
            reason: e.to_string(),
        })?;

        Ok(Self::new(rng, distribution))
    }
}

impl<R: Rng, D: Distribution<f64>> WeightGen for RandWeightGen<R, D> {
    fn sample(&mut self) -> f64 {
        self.distribution.sample(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut weight_gen = RandWeightGen::uniform(seeded_rng(), -0.01, 0.01).unwrap();

        for _ in 0..1000 {
            let w = weight_gen.sample();
            assert!((-0.01..0.01).contains(&w));
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = RandWeightGen::normal(seeded_rng(), 0., 1.).unwrap();
        let mut b = RandWeightGen::normal(seeded_rng(), 0., 1.).unwrap();

        let a: Vec<_> = (0..16).map(|_| a.sample()).collect();
        let b: Vec<_> = (0..16).map(|_| b.sample()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_ranges() {
        assert!(matches!(
            RandWeightGen::uniform(seeded_rng(), 1., -1.),
            Err(RandErr::Uniform { low, .. }) if low == 1.
        ));
        assert!(matches!(
            RandWeightGen::normal(seeded_rng(), 0., f64::NAN),
            Err(RandErr::Normal { mean, .. }) if mean == 0.
        ));
    }
}
