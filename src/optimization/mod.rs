mod adam;
mod error;
mod optimizer;
mod sgd;

pub use adam::Adam;
pub use error::{HyperparamErr, Result};
pub use optimizer::Optimizer;
pub use sgd::Sgd;
