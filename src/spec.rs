use serde::{Deserialize, Serialize};

use crate::initialization::DEFAULT_INIT_RANGE;

/// The specification for the initial weights of a network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitSpec {
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
    Const { value: f64 },
}

impl Default for InitSpec {
    fn default() -> Self {
        Self::Uniform {
            low: -DEFAULT_INIT_RANGE,
            high: DEFAULT_INIT_RANGE,
        }
    }
}

/// The specification for the `Optimizer` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerSpec {
    Sgd {
        learning_rate: f64,
        #[serde(default)]
        momentum: f64,
        #[serde(default)]
        weight_decay: f64,
    },
    Adam {
        learning_rate: f64,
        beta1: f64,
        beta2: f64,
        epsilon: f64,
    },
}

/// The specification for a `Net`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetSpec {
    pub architecture: Vec<usize>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub init: InitSpec,
    pub optimizer: OptimizerSpec,
    #[serde(default = "default_train")]
    pub train: bool,
    #[serde(default = "default_update_frequency")]
    pub update_frequency: usize,
}

fn default_train() -> bool {
    true
}

fn default_update_frequency() -> usize {
    1
}
