mod constant;
mod error;
mod random;
mod weight_gen;

pub use constant::ConstWeightGen;
pub use error::{RandErr, Result};
pub use random::RandWeightGen;
pub use weight_gen::WeightGen;

/// The half width of the default uniform weight interval.
pub const DEFAULT_INIT_RANGE: f64 = 0.01;
