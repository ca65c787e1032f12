/// Dense index of a parameter inside its owning unit.
///
/// Weights take the ids `0..fan_in` in upstream slot order, the bias (if any) comes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub usize);

/// A scalar trainable value together with its gradient bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub value: f64,
    pub requires_grad: bool,
    cached_input: f64,
    grad: f64,
}

impl Param {
    /// Creates a new trainable `Param`.
    ///
    /// # Arguments
    /// * `value` - The initial value.
    ///
    /// # Returns
    /// A new `Param` with a zeroed gradient.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            requires_grad: true,
            cached_input: 0.,
            grad: 0.,
        }
    }

    /// Creates a new `Param` that optimizers leave untouched.
    pub fn frozen(value: f64) -> Self {
        Self {
            requires_grad: false,
            ..Self::new(value)
        }
    }

    /// The gradient accumulated since the last step.
    pub fn grad(&self) -> f64 {
        self.grad
    }

    /// The input value seen on the last forward pass.
    pub fn cached_input(&self) -> f64 {
        self.cached_input
    }

    /// The weighted contribution of the cached input.
    pub fn contribution(&self) -> f64 {
        self.value * self.cached_input
    }

    pub(crate) fn cache_input(&mut self, input: f64) {
        self.cached_input = input;
    }

    /// Adds `grad` to the accumulated gradient, frozen parameters ignore it.
    pub(crate) fn accumulate(&mut self, grad: f64) {
        if self.requires_grad {
            self.grad += grad;
        }
    }

    pub(crate) fn zero_grad(&mut self) {
        self.grad = 0.;
    }
}
