/// The activation applied by a unit to its pre-activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Identity,
    Relu,
}

impl Activation {
    pub fn f(&self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Relu => x.max(0.),
        }
    }

    /// Applies the derivative at `pre_activation` to an incoming gradient.
    ///
    /// Relu zeroes the gradient whenever the unit didn't fire (`pre_activation <= 0`).
    pub fn df(&self, pre_activation: f64, grad: f64) -> f64 {
        match self {
            Self::Identity => grad,
            Self::Relu if pre_activation <= 0. => 0.,
            Self::Relu => grad,
        }
    }
}
