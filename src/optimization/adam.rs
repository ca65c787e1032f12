use super::{HyperparamErr, Optimizer, Result};
use crate::param::{Param, ParamId};

/// Per parameter state, `beta1_t` and `beta2_t` hold the betas raised to the step count.
#[derive(Debug, Clone, Copy)]
struct Moments {
    v: f64,
    s: f64,
    beta1_t: f64,
    beta2_t: f64,
}

impl Default for Moments {
    fn default() -> Self {
        Self {
            v: 0.,
            s: 0.,
            beta1_t: 1.,
            beta2_t: 1.,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    moments: Vec<Moments>,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `beta1`, `beta2`, `epsilon` - Hyperparameters to the optimization algorithm.
    ///
    /// # Returns
    /// A new `Adam` instance or an error if any hyperparameter is out of range.
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Result<Self> {
        let beta = |v: f64| (0. ..1.).contains(&v);

        Ok(Self {
            learning_rate: HyperparamErr::check("learning_rate", learning_rate, ">= 0", |v| {
                v.is_finite() && v >= 0.
            })?,
            beta1: HyperparamErr::check("beta1", beta1, "in [0, 1)", beta)?,
            beta2: HyperparamErr::check("beta2", beta2, "in [0, 1)", beta)?,
            epsilon: HyperparamErr::check("epsilon", epsilon, "> 0", |v| {
                v.is_finite() && v > 0.
            })?,
            moments: Vec::new(),
        })
    }
}

impl Optimizer for Adam {
    fn step(&mut self, id: ParamId, param: &mut Param) {
        if !param.requires_grad {
            return;
        }

        if self.moments.len() <= id.0 {
            self.moments.resize(id.0 + 1, Moments::default());
        }

        let Self {
            learning_rate: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            ..
        } = *self;

        let m = &mut self.moments[id.0];
        let g = param.grad();

        m.beta1_t *= b1;
        m.beta2_t *= b2;
        m.v = b1 * m.v + (1. - b1) * g;
        m.s = b2 * m.s + (1. - b2) * g.powi(2);

        let v_hat = m.v / (1. - m.beta1_t);
        let s_hat = m.s / (1. - m.beta2_t);
        param.value -= lr * v_hat / (s_hat.sqrt() + eps);
    }

    fn fork(&self, len: usize) -> Box<dyn Optimizer> {
        Box::new(Self {
            moments: vec![Moments::default(); len],
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_by_the_learning_rate() {
        let mut opt = Adam::new(0.1, 0.9, 0.999, 1e-8).unwrap();
        let mut p = Param::new(1.);
        p.accumulate(2.);

        opt.step(ParamId(0), &mut p);
        assert!((p.value - 0.9).abs() < 1e-6);
    }

    #[test]
    fn bias_correction_follows_the_step_count() {
        let mut opt = Adam::new(0.1, 0.9, 0.999, 1e-8).unwrap();
        let mut p = Param::new(0.);

        for _ in 0..2 {
            p.accumulate(1.);
            opt.step(ParamId(0), &mut p);
            p.zero_grad();
        }

        // A constant gradient is fully corrected on every step.
        assert!((p.value + 0.2).abs() < 1e-6);
    }

    #[test]
    fn params_keep_separate_moments() {
        let mut opt = Adam::new(0.1, 0.9, 0.999, 1e-8).unwrap().fork(2);

        let mut a = Param::new(0.);
        a.accumulate(1.);
        let mut b = Param::new(0.);
        b.accumulate(-1.);

        opt.step(ParamId(0), &mut a);
        opt.step(ParamId(1), &mut b);
        assert!((a.value + 0.1).abs() < 1e-6);
        assert!((b.value - 0.1).abs() < 1e-6);
    }

    #[test]
    fn rejects_invalid_hyperparameters() {
        assert_eq!(Adam::new(0.1, 1., 0.9, 1e-8).unwrap_err().name, "beta1");
        assert_eq!(Adam::new(0.1, 0.9, -0.1, 1e-8).unwrap_err().name, "beta2");
        assert_eq!(Adam::new(0.1, 0.9, 0.99, 0.).unwrap_err().name, "epsilon");
    }
}
