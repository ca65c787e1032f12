use futures::future;
use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;

use super::CompletionBarrier;
use crate::{
    error::{NetErr, Result},
    initialization::{DEFAULT_INIT_RANGE, RandWeightGen, WeightGen},
    optimization::Optimizer,
    topology::{Boundary, Topology, TopologyBuilder},
    unit::{Command, RunConfig, Unit, UnitErr, UnitSnapshot},
};

/// Where a running network is inside its forward, backward and sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Inputs may have been sent, but not every output was collected.
    Forwarding,
    AwaitingBackward,
    /// Gradients may have been sent, but not every input gradient was collected.
    Backwarding,
    AwaitingSync,
}

/// Everything a network holds once its units were spawned.
struct Running {
    train: bool,
    phase: Phase,
    boundary: Boundary,
    controls: Vec<mpsc::Sender<Command>>,
    barrier: CompletionBarrier,
    tasks: JoinSet<std::result::Result<(), UnitErr>>,
}

/// A feed-forward network where every neuron runs as its own task.
///
/// Callers drive it through `forward`, `backward` and `sync`, the units do the rest by
/// exchanging messages with their neighbours. Dropping the network cancels every unit.
pub struct Net {
    architecture: Vec<usize>,
    token: CancellationToken,
    unstarted: Option<Topology>,
    running: Option<Running>,
}

impl Net {
    /// Creates a new `Net` with weights sampled uniformly from `[-0.01, 0.01)` using an OS
    /// seeded generator.
    ///
    /// # Arguments
    /// * `architecture` - The size of every layer, input first.
    /// * `optimizer` - The prototype every unit forks its own optimizer from.
    ///
    /// # Returns
    /// A new unstarted network or an error if the architecture is invalid.
    pub fn new(architecture: &[usize], optimizer: &dyn Optimizer) -> Result<Self> {
        Self::with_rng(architecture, StdRng::from_os_rng(), optimizer)
    }

    /// Same as `new` but reproducible, the same seed always yields the same weights.
    pub fn seeded(architecture: &[usize], seed: u64, optimizer: &dyn Optimizer) -> Result<Self> {
        Self::with_rng(architecture, StdRng::seed_from_u64(seed), optimizer)
    }

    /// Creates a new `Net` drawing every initial weight from `weight_gen`.
    ///
    /// # Arguments
    /// * `architecture` - The size of every layer, input first.
    /// * `weight_gen` - The generator for the initial weights.
    /// * `optimizer` - The prototype every unit forks its own optimizer from.
    ///
    /// # Returns
    /// A new unstarted network or an error if the architecture is invalid.
    pub fn with_weight_gen<G>(
        architecture: &[usize],
        weight_gen: &mut G,
        optimizer: &dyn Optimizer,
    ) -> Result<Self>
    where
        G: WeightGen + ?Sized,
    {
        let topology = TopologyBuilder::new(architecture)?.build(weight_gen, optimizer);
        Ok(Self::from_topology(topology))
    }

    /// Wraps an already wired topology.
    pub fn from_topology(topology: Topology) -> Self {
        Self {
            architecture: topology.architecture.clone(),
            token: CancellationToken::new(),
            unstarted: Some(topology),
            running: None,
        }
    }

    fn with_rng(architecture: &[usize], rng: StdRng, optimizer: &dyn Optimizer) -> Result<Self> {
        let mut weight_gen = RandWeightGen::uniform(rng, -DEFAULT_INIT_RANGE, DEFAULT_INIT_RANGE)?;
        Self::with_weight_gen(architecture, &mut weight_gen, optimizer)
    }

    pub fn architecture(&self) -> &[usize] {
        &self.architecture
    }

    pub fn is_started(&self) -> bool {
        self.running.is_some()
    }

    /// The amount of completed passes, each one a forward (plus backward and step when
    /// training) of every unit.
    pub fn completed_passes(&self) -> u64 {
        self.running.as_ref().map_or(0, |r| r.barrier.rounds())
    }

    /// Spawns one task per unit. Must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// * `train` - Whether units run the backward and step stages after every forward.
    /// * `update_frequency` - The amount of passes between optimizer steps, `0` accumulates
    ///   gradients forever without stepping.
    ///
    /// # Returns
    /// `AlreadyStarted` if called more than once.
    pub fn start(&mut self, train: bool, update_frequency: usize) -> Result<()> {
        let topology = self.unstarted.take().ok_or(NetErr::AlreadyStarted)?;
        let Topology {
            layers,
            boundary,
            controls,
            completions,
            ..
        } = topology;

        let units = controls.len();
        info!("starting {units} units: train={train}, update_frequency={update_frequency}");

        let config = RunConfig {
            train,
            update_frequency,
            token: self.token.clone(),
        };

        let mut tasks = JoinSet::new();
        for unit in layers.into_iter().flatten() {
            tasks.spawn(unit.run(config.clone()));
        }

        self.running = Some(Running {
            train,
            phase: Phase::Idle,
            boundary,
            controls,
            barrier: CompletionBarrier::new(completions, units),
            tasks,
        });

        Ok(())
    }

    /// Runs one forward pass.
    ///
    /// If the previous pass still awaits its sync, it is performed first. Without training
    /// the call also waits until every unit finished the pass. Dropping the call before it
    /// returns leaves the network unusable, the next call fails with `Interrupted`.
    ///
    /// # Arguments
    /// * `input` - One value per input unit.
    ///
    /// # Returns
    /// One value per output unit, in unit order.
    pub async fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        let expected = self.architecture[0];
        let running = self.running.as_mut().ok_or(NetErr::NotStarted)?;
        let token = &self.token;

        if input.len() != expected {
            return Err(NetErr::InputSizeMismatch {
                got: input.len(),
                expected,
            });
        }

        match running.phase {
            Phase::AwaitingBackward => {
                return Err(NetErr::OutOfOrder {
                    op: "forward",
                    expected: "backward",
                });
            }
            Phase::Forwarding | Phase::Backwarding => return Err(running.interrupted(token)),
            Phase::AwaitingSync => running.sync(token).await?,
            Phase::Idle => {}
        }

        running.phase = Phase::Forwarding;
        for (tx, &value) in running.boundary.inputs.iter().zip(input) {
            send(tx, value, token).await?;
        }

        let mut output = Vec::with_capacity(running.boundary.outputs.len());
        for rx in running.boundary.outputs.iter_mut() {
            output.push(recv(rx, token).await?);
        }

        if running.train {
            running.phase = Phase::AwaitingBackward;
        } else {
            running.barrier.wait(token).await?;
            running.phase = Phase::Idle;
        }

        Ok(output)
    }

    /// Runs one backward pass for the pending forward.
    ///
    /// # Arguments
    /// * `grad` - The loss gradient with respect to every output, in unit order.
    ///
    /// # Returns
    /// The gradient with respect to every network input.
    pub async fn backward(&mut self, grad: &[f64]) -> Result<Vec<f64>> {
        let expected = self.architecture[self.architecture.len() - 1];
        let running = self.running.as_mut().ok_or(NetErr::NotStarted)?;
        let token = &self.token;

        if !running.train {
            return Err(NetErr::NotTraining);
        }

        if grad.len() != expected {
            return Err(NetErr::GradientSizeMismatch {
                got: grad.len(),
                expected,
            });
        }

        match running.phase {
            Phase::AwaitingBackward => {}
            Phase::Forwarding | Phase::Backwarding => return Err(running.interrupted(token)),
            Phase::Idle | Phase::AwaitingSync => {
                return Err(NetErr::OutOfOrder {
                    op: "backward",
                    expected: "forward",
                });
            }
        }

        running.phase = Phase::Backwarding;
        for (tx, &value) in running.boundary.output_grads.iter().zip(grad) {
            send(tx, value, token).await?;
        }

        let mut input_grad = Vec::with_capacity(running.boundary.input_grads.len());
        for rx in running.boundary.input_grads.iter_mut() {
            input_grad.push(recv(rx, token).await?);
        }

        running.phase = Phase::AwaitingSync;
        Ok(input_grad)
    }

    /// Waits until every unit finished the last backward pass and its optimizer step.
    ///
    /// Does nothing if no pass is awaiting synchronization.
    pub async fn sync(&mut self) -> Result<()> {
        let running = self.running.as_mut().ok_or(NetErr::NotStarted)?;

        match running.phase {
            Phase::AwaitingBackward => Err(NetErr::OutOfOrder {
                op: "sync",
                expected: "backward",
            }),
            Phase::Forwarding | Phase::Backwarding => Err(running.interrupted(&self.token)),
            Phase::AwaitingSync => running.sync(&self.token).await,
            Phase::Idle => Ok(()),
        }
    }

    /// Copies the parameters of every unit, in layer order.
    ///
    /// A running network is synced first, units only answer between passes.
    pub async fn snapshot(&mut self) -> Result<Vec<UnitSnapshot>> {
        if let Some(topology) = &self.unstarted {
            return Ok(topology
                .layers()
                .iter()
                .flatten()
                .map(Unit::snapshot)
                .collect());
        }

        self.sync().await.map_err(|e| match e {
            NetErr::OutOfOrder { expected, .. } => NetErr::OutOfOrder {
                op: "snapshot",
                expected,
            },
            e => e,
        })?;

        let running = self.running.as_ref().ok_or(NetErr::NotStarted)?;
        let token = &self.token;

        let requests = running.controls.iter().map(|tx| async move {
            let (reply, rx) = oneshot::channel();
            send(tx, Command::Snapshot(reply), token).await?;

            tokio::select! {
                biased;
                _ = token.cancelled() => Err(NetErr::Halted),
                snapshot = rx => snapshot.map_err(|_| NetErr::Halted),
            }
        });

        future::try_join_all(requests).await
    }

    /// Cancels every unit and waits for all of them to exit.
    ///
    /// # Returns
    /// The first protocol violation or task failure observed, if any.
    pub async fn shutdown(mut self) -> Result<()> {
        self.token.cancel();

        let Some(mut running) = self.running.take() else {
            return Ok(());
        };

        info!("shutting down after {} passes", running.barrier.rounds());

        let mut first = None;
        while let Some(res) = running.tasks.join_next().await {
            let err = match res {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => NetErr::Unit(e),
                Err(e) => {
                    warn!("unit task failed: {e}");
                    NetErr::Task(e.to_string())
                }
            };

            first.get_or_insert(err);
        }

        debug!("every unit exited");
        first.map_or(Ok(()), Err)
    }
}

impl Running {
    /// Halts the network after a boundary call was dropped halfway, the units may be
    /// holding a pass nobody will ever complete.
    fn interrupted(&self, token: &CancellationToken) -> NetErr {
        let op = match self.phase {
            Phase::Backwarding => "backward",
            _ => "forward",
        };

        warn!("a {op} call was dropped before completing, halting the network");
        token.cancel();
        NetErr::Interrupted { op }
    }

    async fn sync(&mut self, token: &CancellationToken) -> Result<()> {
        self.barrier.wait(token).await?;
        self.phase = Phase::Idle;
        Ok(())
    }
}

impl Drop for Net {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn send<T>(tx: &mpsc::Sender<T>, value: T, token: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(NetErr::Halted),
        res = tx.send(value) => res.map_err(|_| NetErr::Halted),
    }
}

async fn recv<T>(rx: &mut mpsc::Receiver<T>, token: &CancellationToken) -> Result<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(NetErr::Halted),
        msg = rx.recv() => msg.ok_or(NetErr::Halted),
    }
}
