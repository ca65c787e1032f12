use crate::param::{Param, ParamId};

/// Defines the strategy for updating a unit's parameters based on their accumulated gradients.
///
/// Every unit owns its own instance, created through `fork`, so implementations never need
/// to synchronize their state.
pub trait Optimizer: Send {
    /// Updates `param` in place using its accumulated gradient.
    ///
    /// # Arguments
    /// * `id` - The id of the parameter inside its unit, used to key the optimizer's state.
    /// * `param` - The parameter to update.
    fn step(&mut self, id: ParamId, param: &mut Param);

    /// Creates an independent optimizer with the same hyperparameters and fresh state.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters the new instance will be stepping.
    ///
    /// # Returns
    /// A boxed optimizer ready to be handed to a unit.
    fn fork(&self, len: usize) -> Box<dyn Optimizer>;
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn step(&mut self, id: ParamId, param: &mut Param) {
        (**self).step(id, param)
    }

    fn fork(&self, len: usize) -> Box<dyn Optimizer> {
        (**self).fork(len)
    }
}
