mod builder;

use tokio::sync::mpsc;

pub use builder::TopologyBuilder;

use crate::{
    error::{NetErr, Result},
    unit::{Command, Unit},
};

/// The maximum amount of units a single network may spawn.
pub const MAX_UNITS: usize = 1 << 16;

/// Checks that `architecture` describes a valid layered network.
///
/// # Arguments
/// * `architecture` - The size of every layer, input first.
///
/// # Returns
/// An error if there are less than 3 layers, an empty layer or too many units.
pub fn validate(architecture: &[usize]) -> Result<()> {
    if architecture.len() < 3 {
        return Err(NetErr::TooFewLayers {
            got: architecture.len(),
        });
    }

    if let Some(layer) = architecture.iter().position(|&size| size < 1) {
        return Err(NetErr::EmptyLayer { layer });
    }

    // Saturates so an overflowing total still reports as too many units.
    let got = architecture
        .iter()
        .try_fold(0usize, |total, &size| total.checked_add(size))
        .unwrap_or(usize::MAX);

    if got > MAX_UNITS {
        return Err(NetErr::TooManyUnits {
            got,
            max: MAX_UNITS,
        });
    }

    Ok(())
}

/// The network side of every boundary channel, one entry per input or output unit.
pub(crate) struct Boundary {
    pub inputs: Vec<mpsc::Sender<f64>>,
    pub outputs: Vec<mpsc::Receiver<f64>>,
    pub output_grads: Vec<mpsc::Sender<f64>>,
    pub input_grads: Vec<mpsc::Receiver<f64>>,
}

/// A fully wired set of units that hasn't been started yet.
pub struct Topology {
    pub(crate) architecture: Vec<usize>,
    pub(crate) layers: Vec<Vec<Unit>>,
    pub(crate) boundary: Boundary,
    pub(crate) controls: Vec<mpsc::Sender<Command>>,
    pub(crate) completions: mpsc::Receiver<usize>,
}

impl Topology {
    pub fn architecture(&self) -> &[usize] {
        &self.architecture
    }

    pub fn layers(&self) -> &[Vec<Unit>] {
        &self.layers
    }

    pub fn unit_count(&self) -> usize {
        self.architecture.iter().sum()
    }
}
