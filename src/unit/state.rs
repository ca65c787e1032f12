use super::{Activation, Direction, Role, UnitErr, UnitSnapshot};
use crate::{
    optimization::Optimizer,
    param::{Param, ParamId},
    pending::PendingSet,
    signal::{Signal, UnitId},
};

/// A message taken from one of a unit's inlets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Inbound {
    /// A value coming from outside the network (an input or an output gradient).
    External(f64),
    Peer(Signal),
}

/// The private numeric state of one unit, independent of its channels.
///
/// Forward contributions are cached per upstream slot and backward contributions per
/// downstream slot, sums are always evaluated in slot order so the result doesn't depend
/// on the order signals arrive in.
#[derive(Debug)]
pub(crate) struct UnitState {
    id: UnitId,
    role: Role,
    activation: Activation,
    upstream: Vec<UnitId>,
    weights: Vec<Param>,
    bias: Option<Param>,
    downstream: Vec<UnitId>,
    external_input: f64,
    pre_activation: f64,
    incoming: Vec<f64>,
    fan_in: PendingSet,
    fan_out: PendingSet,
}

impl UnitState {
    pub fn new(id: UnitId, role: Role) -> Self {
        Self {
            id,
            role,
            activation: role.activation(),
            upstream: Vec::new(),
            weights: Vec::new(),
            bias: role.initial_bias().map(Param::new),
            downstream: Vec::new(),
            external_input: 0.,
            pre_activation: 0.,
            incoming: Vec::new(),
            fan_in: PendingSet::new(0),
            fan_out: PendingSet::new(0),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Registers `peer` as an upstream connection with the given initial weight.
    ///
    /// # Returns
    /// The slot `peer` must use when signaling this unit.
    pub fn connect_upstream(&mut self, peer: UnitId, weight: f64) -> usize {
        self.upstream.push(peer);
        self.weights.push(Param::new(weight));
        self.upstream.len() - 1
    }

    /// Registers `peer` as a downstream connection.
    ///
    /// # Returns
    /// The slot `peer` must use when sending gradients back to this unit.
    pub fn connect_downstream(&mut self, peer: UnitId) -> usize {
        self.downstream.push(peer);
        self.downstream.len() - 1
    }

    /// Sizes the per-pass bookkeeping once every connection is in place.
    ///
    /// Input units receive a single external value forward, output units a single external
    /// gradient backward.
    pub fn seal(&mut self) {
        let fan_in = match self.role {
            Role::Input => 1,
            _ => self.upstream.len(),
        };

        let fan_out = match self.role {
            Role::Output => 1,
            _ => self.downstream.len(),
        };

        self.fan_in = PendingSet::new(fan_in);
        self.fan_out = PendingSet::new(fan_out);
        self.incoming = vec![0.; fan_out];
    }

    /// The amount of trainable parameters, weights first and then the bias.
    pub fn param_count(&self) -> usize {
        self.weights.len() + self.bias.is_some() as usize
    }

    pub fn begin_forward(&mut self) {
        self.fan_in.reset();
    }

    /// Records one forward contribution.
    ///
    /// # Returns
    /// An error if the message doesn't belong to a pending slot of this unit.
    pub fn accept_forward(&mut self, msg: Inbound) -> Result<(), UnitErr> {
        match msg {
            Inbound::External(value) if self.role == Role::Input => {
                self.take(Direction::Forward, None, 0)?;
                self.external_input = value;
            }
            Inbound::External(_) => {
                return Err(UnitErr::Misrouted {
                    unit: self.id,
                    direction: Direction::Forward,
                    sender: None,
                    slot: 0,
                });
            }
            Inbound::Peer(signal) => {
                self.check_peer(Direction::Forward, &signal)?;
                self.take(Direction::Forward, Some(signal.sender), signal.slot)?;
                self.weights[signal.slot].cache_input(signal.value);
            }
        }

        Ok(())
    }

    pub fn forward_complete(&self) -> bool {
        self.fan_in.is_complete()
    }

    /// Computes the pre-activation from the cached inputs and applies the activation.
    ///
    /// # Returns
    /// The value to broadcast downstream.
    pub fn fire(&mut self) -> f64 {
        self.pre_activation = match self.role {
            Role::Input => self.external_input,
            _ => {
                let bias = self.bias.map_or(0., |b| b.value);
                self.weights
                    .iter()
                    .fold(bias, |acc, w| acc + w.contribution())
            }
        };

        self.activation.f(self.pre_activation)
    }

    pub fn begin_backward(&mut self) {
        self.fan_out.reset();
    }

    /// Records one backward contribution.
    ///
    /// # Returns
    /// An error if the message doesn't belong to a pending slot of this unit.
    pub fn accept_backward(&mut self, msg: Inbound) -> Result<(), UnitErr> {
        let (sender, slot, value) = match msg {
            Inbound::External(value) if self.role == Role::Output => (None, 0, value),
            Inbound::External(_) => {
                return Err(UnitErr::Misrouted {
                    unit: self.id,
                    direction: Direction::Backward,
                    sender: None,
                    slot: 0,
                });
            }
            Inbound::Peer(signal) => {
                self.check_peer(Direction::Backward, &signal)?;
                (Some(signal.sender), signal.slot, signal.value)
            }
        };

        self.take(Direction::Backward, sender, slot)?;
        self.incoming[slot] = value;
        Ok(())
    }

    pub fn backward_complete(&self) -> bool {
        self.fan_out.is_complete()
    }

    /// Sums the incoming gradients, applies the activation's derivative and accumulates the
    /// gradient of every parameter.
    ///
    /// # Returns
    /// The gradient with respect to this unit's pre-activation.
    pub fn backprop(&mut self) -> f64 {
        let grad: f64 = self.incoming.iter().sum();
        let grad = self.activation.df(self.pre_activation, grad);

        for w in &mut self.weights {
            w.accumulate(grad * w.cached_input());
        }

        if let Some(bias) = &mut self.bias {
            bias.accumulate(grad);
        }

        grad
    }

    /// The gradient to send back through upstream `slot`.
    pub fn upstream_grad(&self, slot: usize, grad: f64) -> f64 {
        match self.weights.get(slot) {
            Some(w) => grad * w.value,
            None => grad,
        }
    }

    /// Takes an optimizer step on every parameter and resets the accumulated gradients.
    pub fn step(&mut self, optimizer: &mut dyn Optimizer) {
        let params = self.weights.iter_mut().chain(self.bias.as_mut());

        for (i, param) in params.enumerate() {
            optimizer.step(ParamId(i), param);
            param.zero_grad();
        }
    }

    pub fn snapshot(&self, passes: u64) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            role: self.role,
            weights: self.upstream.iter().copied().zip(self.weights.iter().copied()).collect(),
            bias: self.bias,
            passes,
        }
    }

    fn check_peer(&self, direction: Direction, signal: &Signal) -> Result<(), UnitErr> {
        let peers = match direction {
            Direction::Forward => &self.upstream,
            Direction::Backward => &self.downstream,
        };

        if peers.get(signal.slot) == Some(&signal.sender) {
            Ok(())
        } else {
            Err(UnitErr::Misrouted {
                unit: self.id,
                direction,
                sender: Some(signal.sender),
                slot: signal.slot,
            })
        }
    }

    fn take(
        &mut self,
        direction: Direction,
        sender: Option<UnitId>,
        slot: usize,
    ) -> Result<(), UnitErr> {
        let pending = match direction {
            Direction::Forward => &mut self.fan_in,
            Direction::Backward => &mut self.fan_out,
        };

        pending
            .take(slot)
            .map_err(|e| UnitErr::from_pending(self.id, direction, sender, e))
    }
}
