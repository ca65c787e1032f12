use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::{
    initialization::RandErr, optimization::HyperparamErr, pending::PendingErr, unit::UnitErr,
};

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, NetErr>;

/// Errors surfaced at the network boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum NetErr {
    TooFewLayers {
        got: usize,
    },
    EmptyLayer {
        layer: usize,
    },
    TooManyUnits {
        got: usize,
        max: usize,
    },
    InputSizeMismatch {
        got: usize,
        expected: usize,
    },
    GradientSizeMismatch {
        got: usize,
        expected: usize,
    },
    NotStarted,
    AlreadyStarted,
    NotTraining,
    /// A boundary operation was called while the network expected another one.
    OutOfOrder {
        op: &'static str,
        expected: &'static str,
    },
    /// The network was cancelled while the operation was waiting.
    Halted,
    /// A previous boundary call was dropped before completing.
    Interrupted {
        op: &'static str,
    },
    Unit(UnitErr),
    /// A unit reported completion twice in the same round, or with an unknown ordinal.
    Barrier(PendingErr),
    /// A unit task panicked or was aborted.
    Task(String),
    Hyperparam(HyperparamErr),
    Init(RandErr),
}

impl Display for NetErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewLayers { got } => write!(
                f,
                "a network needs at least 3 layers (input, hidden, output), got {got}"
            ),
            Self::EmptyLayer { layer } => write!(f, "layer {layer} needs at least 1 unit"),
            Self::TooManyUnits { got, max } => {
                write!(f, "the architecture declares {got} units, the maximum is {max}")
            }
            Self::InputSizeMismatch { got, expected } => write!(
                f,
                "input size ({got}) doesn't match the number of input units ({expected})"
            ),
            Self::GradientSizeMismatch { got, expected } => write!(
                f,
                "gradient size ({got}) doesn't match the number of output units ({expected})"
            ),
            Self::NotStarted => f.write_str("the network was not started"),
            Self::AlreadyStarted => f.write_str("the network was already started"),
            Self::NotTraining => f.write_str("the network was started without training"),
            Self::OutOfOrder { op, expected } => {
                write!(f, "called {op} while the network expected {expected}")
            }
            Self::Halted => f.write_str("the network was halted"),
            Self::Interrupted { op } => write!(
                f,
                "a previous {op} was dropped before completing, the network was halted"
            ),
            Self::Unit(e) => write!(f, "protocol violation: {e}"),
            Self::Barrier(e) => write!(f, "completion barrier violated: {e}"),
            Self::Task(e) => write!(f, "unit task failed: {e}"),
            Self::Hyperparam(e) => write!(f, "{e}"),
            Self::Init(e) => write!(f, "{e}"),
        }
    }
}

impl Error for NetErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unit(e) => Some(e),
            Self::Barrier(e) => Some(e),
            Self::Hyperparam(e) => Some(e),
            Self::Init(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UnitErr> for NetErr {
    fn from(value: UnitErr) -> Self {
        Self::Unit(value)
    }
}

impl From<HyperparamErr> for NetErr {
    fn from(value: HyperparamErr) -> Self {
        Self::Hyperparam(value)
    }
}

impl From<RandErr> for NetErr {
    fn from(value: RandErr) -> Self {
        Self::Init(value)
    }
}
