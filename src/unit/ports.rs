use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{Command, state::Inbound};
use crate::signal::{Signal, UnitId};

/// Why a unit stopped waiting on one of its channels.
#[derive(Debug)]
pub(crate) enum Stop {
    /// The network was cancelled or its other end went away.
    Shutdown,
    Failed(super::UnitErr),
}

impl From<super::UnitErr> for Stop {
    fn from(value: super::UnitErr) -> Self {
        Self::Failed(value)
    }
}

/// The receiving end of one direction of a unit.
pub(crate) enum Inlet {
    /// Values fed by the network boundary.
    External(mpsc::Receiver<f64>),
    /// A single inbox shared by every adjacent peer.
    Peers(mpsc::Receiver<Signal>),
}

impl Inlet {
    pub async fn recv(&mut self, token: &CancellationToken) -> Result<Inbound, Stop> {
        match self {
            Self::External(rx) => recv(rx, token).await.map(Inbound::External),
            Self::Peers(rx) => recv(rx, token).await.map(Inbound::Peer),
        }
    }
}

/// A directed edge towards one adjacent peer.
pub(crate) struct Link {
    pub peer: UnitId,
    /// The slot the peer assigned to this unit.
    pub slot: usize,
    pub tx: mpsc::Sender<Signal>,
}

/// The sending end of one direction of a unit.
pub(crate) enum Outlet {
    External(mpsc::Sender<f64>),
    Peers(Vec<Link>),
}

/// Every channel endpoint owned by a unit.
pub(crate) struct Ports {
    pub forward_in: Inlet,
    pub forward_out: Outlet,
    pub backward_in: Inlet,
    pub backward_out: Outlet,
    pub control: mpsc::Receiver<Command>,
    pub done: mpsc::Sender<usize>,
}

/// Receives from `rx` unless the network is cancelled first.
pub(crate) async fn recv<T>(
    rx: &mut mpsc::Receiver<T>,
    token: &CancellationToken,
) -> Result<T, Stop> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Stop::Shutdown),
        msg = rx.recv() => msg.ok_or(Stop::Shutdown),
    }
}

/// Sends `value` through `tx` unless the network is cancelled first.
pub(crate) async fn send<T>(
    tx: &mpsc::Sender<T>,
    value: T,
    token: &CancellationToken,
) -> Result<(), Stop> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Stop::Shutdown),
        res = tx.send(value) => res.map_err(|_| Stop::Shutdown),
    }
}
