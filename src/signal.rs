use std::fmt::{self, Display};

/// Identifies a unit by its layer and its position inside that layer.
///
/// Ids are assigned once by the topology builder and never change, they are displayed as
/// `LLL_IIIIII` (zero padded layer and index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    pub layer: usize,
    pub index: usize,
}

impl UnitId {
    /// Creates a new `UnitId`.
    ///
    /// # Arguments
    /// * `layer` - The layer the unit belongs to.
    /// * `index` - The position of the unit inside its layer.
    ///
    /// # Returns
    /// A new `UnitId` instance.
    pub fn new(layer: usize, index: usize) -> Self {
        Self { layer, index }
    }
}

impl Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}_{:06}", self.layer, self.index)
    }
}

/// A message exchanged between two adjacent units.
///
/// `slot` is the dense connection index the receiver assigned to `sender` when the link was
/// built, the receiver uses it to locate the matching weight without hashing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub sender: UnitId,
    pub slot: usize,
    pub value: f64,
}
