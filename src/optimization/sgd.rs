use super::{HyperparamErr, Optimizer, Result};
use crate::param::{Param, ParamId};

/// Stochastic gradient descent with optional momentum and weight decay.
#[derive(Debug, Clone)]
pub struct Sgd {
    learning_rate: f64,
    momentum: f64,
    weight_decay: f64,
    velocity: Vec<Option<f64>>,
}

impl Sgd {
    /// Creates a new `Sgd` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - The fraction of the previous velocity kept on every step, in `[0, 1)`.
    /// * `weight_decay` - The L2 penalty added to the gradient, non negative.
    ///
    /// # Returns
    /// A new `Sgd` instance or an error if any hyperparameter is out of range.
    pub fn new(learning_rate: f64, momentum: f64, weight_decay: f64) -> Result<Self> {
        Ok(Self {
            learning_rate: HyperparamErr::check("learning_rate", learning_rate, ">= 0", |v| {
                v.is_finite() && v >= 0.
            })?,
            momentum: HyperparamErr::check("momentum", momentum, "in [0, 1)", |v| {
                (0. ..1.).contains(&v)
            })?,
            weight_decay: HyperparamErr::check("weight_decay", weight_decay, ">= 0", |v| {
                v.is_finite() && v >= 0.
            })?,
            velocity: Vec::new(),
        })
    }

    /// The momentum buffer for `id`, if it was ever stepped with momentum enabled.
    pub fn velocity(&self, id: ParamId) -> Option<f64> {
        self.velocity.get(id.0).copied().flatten()
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, id: ParamId, param: &mut Param) {
        if !param.requires_grad {
            return;
        }

        let mut grad = param.grad();
        if self.weight_decay > 0. {
            grad += self.weight_decay * param.value;
        }

        let step = if self.momentum > 0. {
            if self.velocity.len() <= id.0 {
                self.velocity.resize(id.0 + 1, None);
            }

            let v = match self.velocity[id.0] {
                Some(v) => self.momentum * v + grad,
                None => grad,
            };

            self.velocity[id.0] = Some(v);
            v
        } else {
            grad
        };

        param.value -= self.learning_rate * step;
    }

    fn fork(&self, len: usize) -> Box<dyn Optimizer> {
        Box::new(Self {
            velocity: vec![None; len],
            ..self.clone()
        })
    }
}
