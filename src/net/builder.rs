use log::info;
use rand::{SeedableRng, rngs::StdRng};

use super::Net;
use crate::{
    error::Result,
    initialization::{ConstWeightGen, RandWeightGen},
    optimization::{Adam, Optimizer, Sgd},
    spec::{InitSpec, NetSpec, OptimizerSpec},
};

/// Builds running networks out of their specification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetBuilder;

impl NetBuilder {
    /// Creates a new `NetBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds and starts a new `Net` given its specification.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// * `spec` - The specification of the network.
    ///
    /// # Returns
    /// A running network or an error if the specification is invalid.
    pub fn build(&self, spec: &NetSpec) -> Result<Net> {
        info!(
            "building network from spec: arch={:?}, seed={:?}",
            spec.architecture, spec.seed
        );

        let optimizer = self.resolve_optimizer(spec.optimizer)?;
        let mut net = self.resolve_init(spec, optimizer.as_ref())?;
        net.start(spec.train, spec.update_frequency)?;
        Ok(net)
    }

    /// Generates the random number generator, seeded from the OS if `seed` is `None`.
    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Resolves the weight generator and builds the unstarted network with it.
    fn resolve_init(&self, spec: &NetSpec, optimizer: &dyn Optimizer) -> Result<Net> {
        let arch = &spec.architecture;

        match spec.init {
            InitSpec::Const { value } => {
                Net::with_weight_gen(arch, &mut ConstWeightGen::new(value), optimizer)
            }
            InitSpec::Uniform { low, high } => {
                let rng = self.generate_rng(spec.seed);
                let mut weight_gen = RandWeightGen::uniform(rng, low, high)?;
                Net::with_weight_gen(arch, &mut weight_gen, optimizer)
            }
            InitSpec::Normal { mean, std_dev } => {
                let rng = self.generate_rng(spec.seed);
                let mut weight_gen = RandWeightGen::normal(rng, mean, std_dev)?;
                Net::with_weight_gen(arch, &mut weight_gen, optimizer)
            }
        }
    }

    /// Resolves the prototype optimizer every unit forks from.
    fn resolve_optimizer(&self, spec: OptimizerSpec) -> Result<Box<dyn Optimizer>> {
        let optimizer: Box<dyn Optimizer> = match spec {
            OptimizerSpec::Sgd {
                learning_rate,
                momentum,
                weight_decay,
            } => Box::new(Sgd::new(learning_rate, momentum, weight_decay)?),
            OptimizerSpec::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => Box::new(Adam::new(learning_rate, beta1, beta2, epsilon)?),
        };

        Ok(optimizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetErr;

    fn spec(init: InitSpec, optimizer: OptimizerSpec) -> NetSpec {
        NetSpec {
            architecture: vec![2, 3, 1],
            seed: Some(3),
            init,
            optimizer,
            train: true,
            update_frequency: 1,
        }
    }

    fn sgd(learning_rate: f64) -> OptimizerSpec {
        OptimizerSpec::Sgd {
            learning_rate,
            momentum: 0.,
            weight_decay: 0.,
        }
    }

    #[tokio::test]
    async fn builds_a_started_network() {
        let net = NetBuilder::new()
            .build(&spec(InitSpec::default(), sgd(0.1)))
            .unwrap();

        assert!(net.is_started());
        assert_eq!(net.architecture(), [2, 3, 1]);
        net.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn same_seed_same_weights() {
        let init = InitSpec::Normal {
            mean: 0.,
            std_dev: 1.,
        };

        let mut a = NetBuilder::new().build(&spec(init, sgd(0.1))).unwrap();
        let mut b = NetBuilder::new().build(&spec(init, sgd(0.1))).unwrap();
        assert_eq!(a.snapshot().await.unwrap(), b.snapshot().await.unwrap());
    }

    #[tokio::test]
    async fn rejects_invalid_specs() {
        let builder = NetBuilder::new();

        let bad_lr = builder.build(&spec(InitSpec::default(), sgd(-1.)));
        assert!(matches!(bad_lr, Err(NetErr::Hyperparam(_))));

        let bad_range = InitSpec::Uniform { low: 1., high: 0. };
        let bad_init = builder.build(&spec(bad_range, sgd(0.1)));
        assert!(matches!(bad_init, Err(NetErr::Init(_))));

        let mut bad_arch = spec(InitSpec::default(), sgd(0.1));
        bad_arch.architecture = vec![2, 1];
        assert!(matches!(
            builder.build(&bad_arch),
            Err(NetErr::TooFewLayers { got: 2 })
        ));
    }
}
