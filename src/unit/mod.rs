mod activation;
mod actor;
mod error;
mod ports;
mod state;

use tokio::sync::oneshot;

pub use activation::Activation;
pub use actor::Unit;
pub(crate) use actor::RunConfig;
pub use error::{Direction, UnitErr};
pub(crate) use ports::{Inlet, Link, Outlet, Ports};
pub(crate) use state::UnitState;

use crate::{param::Param, signal::UnitId};

/// Initial bias of hidden units.
pub const HIDDEN_BIAS: f64 = 0.1;
/// Initial bias of output units.
pub const OUTPUT_BIAS: f64 = 0.0;

/// The position of a unit in the network, which decides its activation and whether it
/// owns trainable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Input,
    Hidden,
    Output,
}

impl Role {
    pub fn activation(&self) -> Activation {
        match self {
            Role::Hidden => Activation::Relu,
            Role::Input | Role::Output => Activation::Identity,
        }
    }

    /// The starting bias, input units don't have one.
    pub fn initial_bias(&self) -> Option<f64> {
        match self {
            Role::Input => None,
            Role::Hidden => Some(HIDDEN_BIAS),
            Role::Output => Some(OUTPUT_BIAS),
        }
    }
}

/// Commands a unit serves while idle between passes.
pub(crate) enum Command {
    Snapshot(oneshot::Sender<UnitSnapshot>),
}

/// A copy of a unit's parameters taken between passes.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub role: Role,
    /// One entry per upstream peer, in slot order.
    pub weights: Vec<(UnitId, Param)>,
    pub bias: Option<Param>,
    /// Completed forward/backward/step cycles.
    pub passes: u64,
}

impl UnitSnapshot {
    /// The weight of the connection coming from `peer`.
    pub fn weight_from(&self, peer: UnitId) -> Option<&Param> {
        self.weights.iter().find(|(id, _)| *id == peer).map(|(_, p)| p)
    }
}
