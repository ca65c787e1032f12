use log::{debug, info, trace};
use tokio::sync::mpsc;

use super::{Boundary, Topology, validate};
use crate::{
    error::Result,
    initialization::WeightGen,
    optimization::Optimizer,
    signal::{Signal, UnitId},
    unit::{Inlet, Link, Outlet, Ports, Role, Unit, UnitState},
};

/// A unit whose connections are still being wired, together with the sending halves of
/// its own inboxes.
struct Draft {
    state: UnitState,
    ports: Ports,
    forward_tx: Option<mpsc::Sender<Signal>>,
    backward_tx: Option<mpsc::Sender<Signal>>,
}

/// Builds a fully-connected layered `Topology`.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    architecture: Vec<usize>,
}

impl TopologyBuilder {
    /// Creates a new `TopologyBuilder`.
    ///
    /// # Arguments
    /// * `architecture` - The size of every layer, input first.
    ///
    /// # Returns
    /// A new builder or an error if the architecture is invalid.
    pub fn new(architecture: &[usize]) -> Result<Self> {
        validate(architecture)?;

        Ok(Self {
            architecture: architecture.to_vec(),
        })
    }

    /// Creates every unit and connects each unit in layer `i` to every unit in layer `i + 1`.
    ///
    /// # Arguments
    /// * `weight_gen` - The generator for the initial weight of every edge, sampled layer by
    ///   layer, upstream unit first.
    /// * `optimizer` - The prototype every unit forks its own optimizer from.
    ///
    /// # Returns
    /// The wired, not yet running, topology.
    pub fn build<G>(self, weight_gen: &mut G, optimizer: &dyn Optimizer) -> Topology
    where
        G: WeightGen + ?Sized,
    {
        let architecture = self.architecture;
        let nlayers = architecture.len();
        let nunits = architecture.iter().sum();

        info!("building a {nlayers} layer network: arch={architecture:?}");

        let (done_tx, completions) = mpsc::channel(nunits);
        let mut controls = Vec::with_capacity(nunits);
        let mut boundary = Boundary {
            inputs: Vec::with_capacity(architecture[0]),
            outputs: Vec::with_capacity(architecture[nlayers - 1]),
            output_grads: Vec::with_capacity(architecture[nlayers - 1]),
            input_grads: Vec::with_capacity(architecture[0]),
        };

        let mut drafts: Vec<Vec<Draft>> = Vec::with_capacity(nlayers);

        for (layer, &size) in architecture.iter().enumerate() {
            let role = match layer {
                0 => Role::Input,
                l if l == nlayers - 1 => Role::Output,
                _ => Role::Hidden,
            };

            let fan_in = layer.checked_sub(1).map_or(1, |l| architecture[l]);
            let fan_out = architecture.get(layer + 1).copied().unwrap_or(1);

            let drafted = (0..size)
                .map(|index| {
                    let id = UnitId::new(layer, index);
                    debug!(layer = layer, index = index; "new {role:?} unit {id}");

                    let (forward_in, forward_tx) = match role {
                        Role::Input => {
                            let (tx, rx) = mpsc::channel(1);
                            boundary.inputs.push(tx);
                            (Inlet::External(rx), None)
                        }
                        _ => {
                            let (tx, rx) = mpsc::channel(fan_in);
                            (Inlet::Peers(rx), Some(tx))
                        }
                    };

                    let forward_out = match role {
                        Role::Output => {
                            let (tx, rx) = mpsc::channel(1);
                            boundary.outputs.push(rx);
                            Outlet::External(tx)
                        }
                        _ => Outlet::Peers(Vec::with_capacity(fan_out)),
                    };

                    let (backward_in, backward_tx) = match role {
                        Role::Output => {
                            let (tx, rx) = mpsc::channel(1);
                            boundary.output_grads.push(tx);
                            (Inlet::External(rx), None)
                        }
                        _ => {
                            let (tx, rx) = mpsc::channel(fan_out);
                            (Inlet::Peers(rx), Some(tx))
                        }
                    };

                    let backward_out = match role {
                        Role::Input => {
                            let (tx, rx) = mpsc::channel(1);
                            boundary.input_grads.push(rx);
                            Outlet::External(tx)
                        }
                        _ => Outlet::Peers(Vec::with_capacity(fan_in)),
                    };

                    let (control_tx, control) = mpsc::channel(1);
                    controls.push(control_tx);

                    Draft {
                        state: UnitState::new(id, role),
                        ports: Ports {
                            forward_in,
                            forward_out,
                            backward_in,
                            backward_out,
                            control,
                            done: done_tx.clone(),
                        },
                        forward_tx,
                        backward_tx,
                    }
                })
                .collect();

            drafts.push(drafted);
        }

        for layer in 0..nlayers - 1 {
            let (lower, upper) = drafts.split_at_mut(layer + 1);

            for up in lower[layer].iter_mut() {
                for down in upper[0].iter_mut() {
                    connect(up, down, weight_gen.sample());
                }
            }
        }

        let mut ordinal = 0;
        let layers = drafts
            .into_iter()
            .map(|layer| {
                layer
                    .into_iter()
                    .map(|draft| {
                        let optimizer = optimizer.fork(draft.state.param_count());
                        let unit = Unit::new(ordinal, draft.state, draft.ports, optimizer);
                        ordinal += 1;
                        unit
                    })
                    .collect()
            })
            .collect();

        Topology {
            architecture,
            layers,
            boundary,
            controls,
            completions,
        }
    }
}

/// Connects `up -> down` with a forward channel pair and a backward channel pair.
fn connect(up: &mut Draft, down: &mut Draft, weight: f64) {
    let (up_id, down_id) = (up.state.id(), down.state.id());

    let up_slot = down.state.connect_upstream(up_id, weight);
    let down_slot = up.state.connect_downstream(down_id);

    if let (Outlet::Peers(links), Some(tx)) = (&mut up.ports.forward_out, &down.forward_tx) {
        links.push(Link {
            peer: down_id,
            slot: up_slot,
            tx: tx.clone(),
        });
    }

    if let (Outlet::Peers(links), Some(tx)) = (&mut down.ports.backward_out, &up.backward_tx) {
        links.push(Link {
            peer: up_id,
            slot: down_slot,
            tx: tx.clone(),
        });
    }

    trace!("connect: {up_id} -> {down_id} (w={weight})");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::NetErr,
        initialization::{ConstWeightGen, RandWeightGen},
        optimization::Sgd,
        unit::{HIDDEN_BIAS, OUTPUT_BIAS},
    };
    use rand::{SeedableRng, rngs::StdRng};

    fn sgd() -> Sgd {
        Sgd::new(1., 0., 0.).unwrap()
    }

    fn build(architecture: &[usize], weight_gen: &mut impl WeightGen) -> Topology {
        TopologyBuilder::new(architecture)
            .unwrap()
            .build(weight_gen, &sgd())
    }

    #[test]
    fn layer_sizes_match_the_architecture() {
        let arch = [2, 4, 4, 1];
        let topology = build(&arch, &mut ConstWeightGen::new(0.5));

        assert_eq!(topology.architecture(), arch);
        assert_eq!(topology.unit_count(), 11);
        for (layer, &size) in topology.layers().iter().zip(&arch) {
            assert_eq!(layer.len(), size);
        }

        assert_eq!(topology.boundary.inputs.len(), 2);
        assert_eq!(topology.boundary.input_grads.len(), 2);
        assert_eq!(topology.boundary.outputs.len(), 1);
        assert_eq!(topology.boundary.output_grads.len(), 1);
        assert_eq!(topology.controls.len(), 11);
    }

    #[test]
    fn ids_encode_layer_and_position() {
        let topology = build(&[2, 3, 1], &mut ConstWeightGen::new(0.5));

        for (l, layer) in topology.layers().iter().enumerate() {
            for (i, unit) in layer.iter().enumerate() {
                assert_eq!(unit.id(), UnitId::new(l, i));
            }
        }
        assert_eq!(topology.layers()[2][0].id().to_string(), "002_000000");
    }

    #[test]
    fn every_unit_connects_to_the_whole_previous_layer() {
        let topology = build(&[2, 3, 2], &mut ConstWeightGen::new(0.5));
        let layers = topology.layers();

        for (l, layer) in layers.iter().enumerate() {
            for unit in layer {
                let snapshot = unit.snapshot();
                let upstream: Vec<_> = snapshot.weights.iter().map(|(id, _)| *id).collect();

                match l {
                    0 => {
                        assert!(upstream.is_empty());
                        assert_eq!(snapshot.bias, None);
                    }
                    _ => {
                        let prev: Vec<_> = layers[l - 1].iter().map(|u| u.id()).collect();
                        assert_eq!(upstream, prev);
                        assert!(snapshot.weights.iter().all(|(_, w)| w.value == 0.5));
                    }
                }
            }
        }

        assert_eq!(layers[1][0].snapshot().bias.unwrap().value, HIDDEN_BIAS);
        assert_eq!(layers[2][1].snapshot().bias.unwrap().value, OUTPUT_BIAS);
    }

    #[test]
    fn seeded_weights_are_reproducible() {
        let weights = |seed| {
            let rng = StdRng::seed_from_u64(seed);
            let mut weight_gen = RandWeightGen::uniform(rng, -0.01, 0.01).unwrap();
            let topology = build(&[3, 4, 2], &mut weight_gen);

            topology
                .layers()
                .iter()
                .flatten()
                .flat_map(|u| u.snapshot().weights)
                .map(|(_, w)| w.value)
                .collect::<Vec<_>>()
        };

        let a = weights(12);
        assert_eq!(a.len(), 3 * 4 + 4 * 2);
        assert!(a.iter().all(|w| (-0.01..0.01).contains(w)));
        assert_eq!(a, weights(12));
        assert_ne!(a, weights(13));
    }

    #[test]
    fn rejects_invalid_architectures() {
        assert_eq!(
            TopologyBuilder::new(&[2, 4]).unwrap_err(),
            NetErr::TooFewLayers { got: 2 }
        );
        assert_eq!(
            TopologyBuilder::new(&[2, 4, 0]).unwrap_err(),
            NetErr::EmptyLayer { layer: 2 }
        );
    }
}
