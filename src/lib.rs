pub mod error;
pub mod initialization;
pub mod loss;
pub mod net;
pub mod optimization;
pub mod param;
pub mod pending;
pub mod signal;
pub mod spec;
pub mod topology;
pub mod unit;

pub use error::{NetErr, Result};
pub use net::{Net, NetBuilder};
pub use signal::{Signal, UnitId};
pub use unit::UnitSnapshot;
