use log::{debug, error, trace, warn};
use tokio_util::sync::CancellationToken;

use super::{
    Command, UnitErr, UnitSnapshot,
    ports::{self, Outlet, Ports, Stop},
    state::{Inbound, UnitState},
};
use crate::{optimization::Optimizer, signal::Signal, signal::UnitId};

/// How every unit of a network runs once started.
#[derive(Debug, Clone)]
pub(crate) struct RunConfig {
    pub train: bool,
    /// Passes between optimizer steps, `0` never steps.
    pub update_frequency: usize,
    pub token: CancellationToken,
}

/// A neuron running as an independent task.
///
/// All of its state is private, the only way to interact with it is through its channels.
pub struct Unit {
    ordinal: usize,
    state: UnitState,
    ports: Ports,
    optimizer: Box<dyn Optimizer>,
    passes: u64,
}

impl Unit {
    /// Assembles a unit whose connections are already in place.
    ///
    /// # Arguments
    /// * `ordinal` - The unit's dense position in the whole network, reported on completion.
    /// * `state` - The unit's numeric state.
    /// * `ports` - The unit's channel endpoints.
    /// * `optimizer` - The unit's own optimizer instance.
    pub(crate) fn new(
        ordinal: usize,
        mut state: UnitState,
        ports: Ports,
        optimizer: Box<dyn Optimizer>,
    ) -> Self {
        state.seal();

        Self {
            ordinal,
            state,
            ports,
            optimizer,
            passes: 0,
        }
    }

    pub fn id(&self) -> UnitId {
        self.state.id()
    }

    pub fn snapshot(&self) -> UnitSnapshot {
        self.state.snapshot(self.passes)
    }

    /// Runs forward, backward and step cycles until the network is cancelled.
    ///
    /// # Returns
    /// An error if a protocol violation was detected, in which case the whole network is
    /// cancelled before returning.
    pub(crate) async fn run(mut self, config: RunConfig) -> Result<(), UnitErr> {
        let id = self.id();
        debug!(layer = id.layer, index = id.index; "unit started");

        loop {
            match self.cycle(&config).await {
                Ok(()) => {}
                Err(Stop::Shutdown) => {
                    debug!(layer = id.layer, index = id.index, passes = self.passes; "unit stopped");
                    return Ok(());
                }
                Err(Stop::Failed(e)) => {
                    error!("{e}");
                    config.token.cancel();
                    return Err(e);
                }
            }
        }
    }

    async fn cycle(&mut self, config: &RunConfig) -> Result<(), Stop> {
        let token = &config.token;
        let first = self.idle(token).await?;
        self.forward(first, token).await?;

        if config.train {
            self.backward(token).await?;

            let pass = self.passes + 1;
            let freq = config.update_frequency as u64;
            if freq > 0 && pass % freq == 0 {
                self.state.step(&mut *self.optimizer);
            }
        }

        self.passes += 1;
        ports::send(&self.ports.done, self.ordinal, token).await
    }

    /// Serves control commands until the first forward message of the next pass arrives.
    async fn idle(&mut self, token: &CancellationToken) -> Result<Inbound, Stop> {
        loop {
            let cmd = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(Stop::Shutdown),
                Some(cmd) = self.ports.control.recv() => cmd,
                msg = self.ports.forward_in.recv(token) => return msg,
            };

            match cmd {
                Command::Snapshot(reply) => {
                    if reply.send(self.snapshot()).is_err() {
                        warn!("snapshot of {} requested but nobody is listening", self.id());
                    }
                }
            }
        }
    }

    async fn forward(&mut self, first: Inbound, token: &CancellationToken) -> Result<(), Stop> {
        let Self { state, ports, .. } = self;

        state.begin_forward();
        state.accept_forward(first)?;
        while !state.forward_complete() {
            let msg = ports.forward_in.recv(token).await?;
            state.accept_forward(msg)?;
        }

        let value = state.fire();
        trace!("{} fired {value}", state.id());

        match &ports.forward_out {
            Outlet::External(tx) => ports::send(tx, value, token).await?,
            Outlet::Peers(links) => {
                for link in links {
                    trace!("{} -> {}", state.id(), link.peer);
                    let signal = Signal {
                        sender: state.id(),
                        slot: link.slot,
                        value,
                    };
                    ports::send(&link.tx, signal, token).await?;
                }
            }
        }

        Ok(())
    }

    async fn backward(&mut self, token: &CancellationToken) -> Result<(), Stop> {
        let Self { state, ports, .. } = self;

        state.begin_backward();
        while !state.backward_complete() {
            let msg = ports.backward_in.recv(token).await?;
            state.accept_backward(msg)?;
        }

        let grad = state.backprop();
        trace!("{} backpropagated {grad}", state.id());

        match &ports.backward_out {
            Outlet::External(tx) => ports::send(tx, grad, token).await?,
            Outlet::Peers(links) => {
                for (slot, link) in links.iter().enumerate() {
                    let signal = Signal {
                        sender: state.id(),
                        slot: link.slot,
                        value: state.upstream_grad(slot, grad),
                    };
                    ports::send(&link.tx, signal, token).await?;
                }
            }
        }

        Ok(())
    }
}
