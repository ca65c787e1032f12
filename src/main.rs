use std::{env, fs, time::Instant};

use anyhow::{Context, Result};
use log::{info, warn};
use neuron_actors::{
    Net, NetBuilder,
    loss::margin_loss,
    spec::{InitSpec, NetSpec, OptimizerSpec},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;
use serde::Deserialize;
use tokio::signal;

/// A demo training run: a network plus the two-class Gaussian data it learns from.
#[derive(Debug, Deserialize)]
struct TrainingSpec {
    net: NetSpec,
    #[serde(default = "default_steps")]
    steps: usize,
    #[serde(default = "default_log_every")]
    log_every: usize,
    data_seed: Option<u64>,
}

fn default_steps() -> usize {
    200
}

fn default_log_every() -> usize {
    10
}

impl Default for TrainingSpec {
    fn default() -> Self {
        Self {
            net: NetSpec {
                architecture: vec![64, 128, 128, 1],
                seed: Some(2020),
                init: InitSpec::default(),
                optimizer: OptimizerSpec::Sgd {
                    learning_rate: 0.1,
                    momentum: 0.9,
                    weight_decay: 1e-5,
                },
                train: true,
                update_frequency: 32,
            },
            steps: default_steps(),
            log_every: default_log_every(),
            data_seed: Some(2020),
        }
    }
}

fn load_spec() -> Result<TrainingSpec> {
    let Some(path) = env::args().nth(1) else {
        return Ok(TrainingSpec::default());
    };

    let raw = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid training spec in {path}"))
}

/// Draws a sample of a two class Gaussian mixture centered at `2 * target`.
fn gaussian_sample(rng: &mut impl Rng, dim: usize) -> (Vec<f64>, i32) {
    let target = if rng.random_bool(0.5) { 1 } else { -1 };
    let center = 2. * target as f64;

    let data = (0..dim)
        .map(|_| rng.sample::<f64, _>(StandardNormal) + center)
        .collect();

    (data, target)
}

async fn train(net: &mut Net, spec: &TrainingSpec) -> Result<()> {
    let dim = spec.net.architecture[0];
    let mut rng = match spec.data_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let start = Instant::now();
    for step in 1..=spec.steps {
        let (data, target) = gaussian_sample(&mut rng, dim);
        let score = net.forward(&data).await?;
        let (loss, grad) = margin_loss(score[0], target)?;

        if spec.net.train {
            net.backward(&[grad]).await?;
        }

        if spec.log_every > 0 && step % spec.log_every == 0 {
            info!(step = step, loss = loss, grad = grad; "step={step:06} loss={loss:.5e} grad={grad:.5e}");
        }
    }

    net.sync().await?;

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "done {} steps in {elapsed:.2}s ({:.2} steps/s)",
        spec.steps,
        spec.steps as f64 / elapsed
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let spec = load_spec()?;
    if spec.net.architecture.last() != Some(&1) {
        anyhow::bail!("the demo scores a single output, got {:?}", spec.net.architecture);
    }

    let mut net = NetBuilder::new()
        .build(&spec.net)
        .context("failed to build the network")?;

    tokio::select! {
        res = train(&mut net, &spec) => res?,
        _ = signal::ctrl_c() => warn!("interrupted, shutting down"),
    }

    net.shutdown().await.context("a unit failed")?;
    Ok(())
}
