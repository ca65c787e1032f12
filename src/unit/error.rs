use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::{pending::PendingErr, signal::UnitId};

/// The direction a signal travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Backward => f.write_str("backward"),
        }
    }
}

/// Protocol violations detected by a unit while running.
///
/// A unit that hits one of these stops its loop and cancels the whole network.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitErr {
    /// A signal arrived on a slot that doesn't belong to its sender.
    Misrouted {
        unit: UnitId,
        direction: Direction,
        sender: Option<UnitId>,
        slot: usize,
    },
    /// The same slot delivered twice within one pass.
    Duplicate {
        unit: UnitId,
        direction: Direction,
        slot: usize,
    },
}

impl UnitErr {
    pub(super) fn from_pending(
        unit: UnitId,
        direction: Direction,
        sender: Option<UnitId>,
        err: PendingErr,
    ) -> Self {
        match err {
            PendingErr::OutOfRange { slot, .. } => Self::Misrouted {
                unit,
                direction,
                sender,
                slot,
            },
            PendingErr::Duplicate { slot } => Self::Duplicate {
                unit,
                direction,
                slot,
            },
        }
    }
}

impl Display for UnitErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Misrouted {
                unit,
                direction,
                sender: Some(sender),
                slot,
            } => write!(
                f,
                "unit {unit}: {direction} signal from {sender} arrived on foreign slot {slot}"
            ),
            Self::Misrouted {
                unit,
                direction,
                sender: None,
                slot,
            } => write!(
                f,
                "unit {unit}: unexpected external {direction} value on slot {slot}"
            ),
            Self::Duplicate {
                unit,
                direction,
                slot,
            } => write!(
                f,
                "unit {unit}: received {direction} slot {slot} twice in the same pass"
            ),
        }
    }
}

impl Error for UnitErr {}
