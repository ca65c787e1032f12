#![allow(dead_code)]

use neuron_actors::{UnitSnapshot, unit::Role};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// The update rule of the network's SGD, applied to plain floats.
#[derive(Debug, Clone, Copy)]
pub struct SgdRule {
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
}

/// One neuron of the sequential network.
#[derive(Debug, Clone)]
struct Neuron {
    weights: Vec<f64>,
    weight_grads: Vec<f64>,
    bias: f64,
    bias_grad: f64,
    velocity: Vec<Option<f64>>,
    pre_activation: f64,
}

/// A single threaded multilayer perceptron computing the exact same numbers, in the exact
/// same order, as the concurrent network.
#[derive(Debug, Clone)]
pub struct Reference {
    architecture: Vec<usize>,
    layers: Vec<Vec<Neuron>>,
    activations: Vec<Vec<f64>>,
    passes: u64,
}

impl Reference {
    /// Copies the parameters of a network out of its snapshots.
    pub fn from_snapshots(architecture: &[usize], snapshots: &[UnitSnapshot]) -> Self {
        let mut units = snapshots.iter();
        let layers = architecture
            .iter()
            .map(|&size| {
                units
                    .by_ref()
                    .take(size)
                    .map(|s| Neuron {
                        weights: s.weights.iter().map(|(_, w)| w.value).collect(),
                        weight_grads: s.weights.iter().map(|(_, w)| w.grad()).collect(),
                        bias: s.bias.map_or(0., |b| b.value),
                        bias_grad: s.bias.map_or(0., |b| b.grad()),
                        velocity: vec![None; s.weights.len() + s.bias.is_some() as usize],
                        pre_activation: 0.,
                    })
                    .collect()
            })
            .collect();

        Self {
            architecture: architecture.to_vec(),
            layers,
            activations: Vec::new(),
            passes: 0,
        }
    }

    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let last = self.layers.len() - 1;
        self.activations = vec![input.to_vec()];

        for l in 1..=last {
            let prev = &self.activations[l - 1];
            let out = self.layers[l]
                .iter_mut()
                .map(|n| {
                    n.pre_activation = n
                        .weights
                        .iter()
                        .zip(prev)
                        .fold(n.bias, |acc, (w, x)| acc + w * x);

                    if l == last {
                        n.pre_activation
                    } else {
                        n.pre_activation.max(0.)
                    }
                })
                .collect();

            self.activations.push(out);
        }

        self.activations[last].clone()
    }

    /// Accumulates the gradients of the last forward pass.
    ///
    /// Returns the gradient with respect to the input.
    pub fn backward(&mut self, grad: &[f64]) -> Vec<f64> {
        let last = self.layers.len() - 1;
        let mut deltas = grad.to_vec();

        for l in (1..=last).rev() {
            let prev = &self.activations[l - 1];
            for (n, delta) in self.layers[l].iter_mut().zip(&mut deltas) {
                if l != last && n.pre_activation <= 0. {
                    *delta = 0.;
                }

                for (g, x) in n.weight_grads.iter_mut().zip(prev) {
                    *g += *delta * x;
                }
                n.bias_grad += *delta;
            }

            let upstream = &self.layers[l];
            deltas = (0..self.architecture[l - 1])
                .map(|j| {
                    let incoming: Vec<f64> = upstream
                        .iter()
                        .zip(&deltas)
                        .map(|(n, delta)| delta * n.weights[j])
                        .collect();
                    incoming.iter().sum()
                })
                .collect();
        }

        deltas
    }

    /// Ends a training pass, stepping every `update_frequency` passes.
    pub fn finish_pass(&mut self, rule: SgdRule, update_frequency: u64) {
        self.passes += 1;
        if update_frequency == 0 || self.passes % update_frequency != 0 {
            return;
        }

        for n in self.layers.iter_mut().skip(1).flatten() {
            let Neuron {
                weights,
                weight_grads,
                bias,
                bias_grad,
                velocity,
                ..
            } = n;

            let params = weights
                .iter_mut()
                .zip(weight_grads.iter_mut())
                .chain(std::iter::once((bias, bias_grad)));

            for (i, (value, grad)) in params.enumerate() {
                step(rule, &mut velocity[i], value, *grad);
                *grad = 0.;
            }
        }
    }

    /// Weights as `[layer][unit][slot]`, input layer included and empty.
    pub fn weights(&self) -> Vec<Vec<Vec<f64>>> {
        self.layers
            .iter()
            .map(|layer| layer.iter().map(|n| n.weights.clone()).collect())
            .collect()
    }

    pub fn weight_grads(&self) -> Vec<Vec<Vec<f64>>> {
        self.layers
            .iter()
            .map(|layer| layer.iter().map(|n| n.weight_grads.clone()).collect())
            .collect()
    }

    pub fn biases(&self) -> Vec<Vec<f64>> {
        self.layers
            .iter()
            .map(|layer| layer.iter().map(|n| n.bias).collect())
            .collect()
    }

    /// Shifts one weight, used for finite differences.
    pub fn nudge_weight(&mut self, layer: usize, unit: usize, slot: usize, delta: f64) {
        self.layers[layer][unit].weights[slot] += delta;
    }
}

fn step(rule: SgdRule, velocity: &mut Option<f64>, value: &mut f64, mut grad: f64) {
    if rule.weight_decay > 0. {
        grad += rule.weight_decay * *value;
    }

    let step = if rule.momentum > 0. {
        let v = match *velocity {
            Some(v) => rule.momentum * v + grad,
            None => grad,
        };
        *velocity = Some(v);
        v
    } else {
        grad
    };

    *value -= rule.learning_rate * step;
}

/// Groups snapshot values the same way `Reference` does.
pub fn snapshot_weights(snapshots: &[UnitSnapshot], architecture: &[usize]) -> Vec<Vec<Vec<f64>>> {
    group(snapshots, architecture, |s| {
        s.weights.iter().map(|(_, w)| w.value).collect()
    })
}

pub fn snapshot_weight_grads(
    snapshots: &[UnitSnapshot],
    architecture: &[usize],
) -> Vec<Vec<Vec<f64>>> {
    group(snapshots, architecture, |s| {
        s.weights.iter().map(|(_, w)| w.grad()).collect()
    })
}

pub fn snapshot_biases(snapshots: &[UnitSnapshot], architecture: &[usize]) -> Vec<Vec<f64>> {
    group(snapshots, architecture, |s| match s.role {
        Role::Input => 0.,
        _ => s.bias.map_or(0., |b| b.value),
    })
}

fn group<T>(
    snapshots: &[UnitSnapshot],
    architecture: &[usize],
    f: impl Fn(&UnitSnapshot) -> T,
) -> Vec<Vec<T>> {
    let mut units = snapshots.iter();
    architecture
        .iter()
        .map(|&size| units.by_ref().take(size).map(&f).collect())
        .collect()
}

/// A reproducible stream of inputs in `[-1, 1)`.
pub fn inputs(seed: u64, dim: usize, count: usize) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dim).map(|_| rng.random_range(-1.0..1.0)).collect())
        .collect()
}

pub fn assert_close(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "{a} != {b} (tolerance {tol})");
}
