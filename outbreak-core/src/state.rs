//! Per-node status and event rates for a running simulation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::network::ContactNetwork;
use crate::rng::RandomSource;
use crate::trajectory::Counts;

/// Compartment of a single node.
///
/// Nodes only ever move Susceptible → Infected → Recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Can be infected by an infected neighbor
    Susceptible,
    /// Infectious until recovery
    Infected,
    /// Immune; never changes again
    Recovered,
}

impl NodeStatus {
    /// Returns true for `Susceptible`.
    pub fn is_susceptible(self) -> bool {
        self == NodeStatus::Susceptible
    }

    /// Returns true for `Infected`.
    pub fn is_infected(self) -> bool {
        self == NodeStatus::Infected
    }

    /// Returns true for `Recovered`.
    pub fn is_recovered(self) -> bool {
        self == NodeStatus::Recovered
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Susceptible => write!(f, "S"),
            NodeStatus::Infected => write!(f, "I"),
            NodeStatus::Recovered => write!(f, "R"),
        }
    }
}

/// Outcome of applying one event to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Node moved from Susceptible to Infected
    Infection {
        /// Newly infected node
        node: usize,
    },
    /// Node moved from Infected to Recovered
    Recovery {
        /// Newly recovered node
        node: usize,
    },
}

/// Mutable per-node state owned by one run.
#[derive(Debug, Clone)]
pub struct SimulationState {
    statuses: Vec<NodeStatus>,
    /// Instantaneous hazard of each node's next event
    rates: Vec<f64>,
    /// Infected neighbors of each susceptible node
    pressure: Vec<u32>,
    counts: Counts,
    infection_rate: f64,
    recovery_rate: f64,
}

impl SimulationState {
    /// Seeds `initial_infected` random nodes and computes the initial rates.
    ///
    /// The infected set is chosen by shuffling a status vector whose first
    /// `initial_infected` entries are Infected, using the run's random source.
    pub fn initialize<R: RandomSource>(
        network: &ContactNetwork,
        initial_infected: usize,
        infection_rate: f64,
        recovery_rate: f64,
        rng: &mut R,
    ) -> Self {
        let n = network.len();
        let initial_infected = initial_infected.min(n);

        let mut statuses = vec![NodeStatus::Susceptible; n];
        statuses[..initial_infected].fill(NodeStatus::Infected);
        rng.shuffle(&mut statuses);

        let pressure: Vec<u32> = (0..n)
            .map(|node| {
                if statuses[node].is_susceptible() {
                    network
                        .neighbors(node)
                        .iter()
                        .filter(|&&neighbor| statuses[neighbor].is_infected())
                        .count() as u32
                } else {
                    0
                }
            })
            .collect();

        let mut state = Self {
            rates: vec![0.0; n],
            statuses,
            pressure,
            counts: Counts {
                susceptible: n - initial_infected,
                infected: initial_infected,
                recovered: 0,
            },
            infection_rate,
            recovery_rate,
        };
        for node in 0..n {
            state.refresh_rate(node);
        }
        state
    }

    /// Status of every node, indexed by node.
    pub fn statuses(&self) -> &[NodeStatus] {
        &self.statuses
    }

    /// Current event rate of every node.
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Current S/I/R totals.
    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Sum of all node rates, accumulated in node order.
    pub fn total_rate(&self) -> f64 {
        self.rates.iter().sum()
    }

    /// Picks the first node whose cumulative rate exceeds `threshold`.
    ///
    /// Accumulates in ascending node order, the same order as
    /// [`total_rate`](Self::total_rate), so any threshold strictly below the
    /// total selects a node. Returns `None` when rounding leaves the
    /// cumulative sum at or below the threshold everywhere.
    pub fn select_node(&self, threshold: f64) -> Option<usize> {
        let mut cumulative = 0.0;
        for (node, &rate) in self.rates.iter().enumerate() {
            cumulative += rate;
            if cumulative > threshold {
                return Some(node);
            }
        }
        None
    }

    /// Applies the event chosen for `node` and updates the affected rates.
    ///
    /// Returns `None` for a recovered node, which can never be selected while
    /// its rate is zero.
    pub fn apply_event(&mut self, node: usize, network: &ContactNetwork) -> Option<Transition> {
        let transition = match self.statuses[node] {
            NodeStatus::Susceptible => {
                self.statuses[node] = NodeStatus::Infected;
                self.counts.susceptible -= 1;
                self.counts.infected += 1;
                Transition::Infection { node }
            }
            NodeStatus::Infected => {
                self.statuses[node] = NodeStatus::Recovered;
                self.counts.infected -= 1;
                self.counts.recovered += 1;
                Transition::Recovery { node }
            }
            NodeStatus::Recovered => return None,
        };
        self.pressure[node] = 0;
        self.refresh_rate(node);

        for &neighbor in network.neighbors(node) {
            if !self.statuses[neighbor].is_susceptible() {
                continue;
            }
            match transition {
                Transition::Infection { .. } => self.pressure[neighbor] += 1,
                Transition::Recovery { .. } => {
                    self.pressure[neighbor] = self.pressure[neighbor].saturating_sub(1)
                }
            }
            self.refresh_rate(neighbor);
        }

        Some(transition)
    }

    fn refresh_rate(&mut self, node: usize) {
        self.rates[node] = match self.statuses[node] {
            NodeStatus::Susceptible => self.infection_rate * f64::from(self.pressure[node]),
            NodeStatus::Infected => self.recovery_rate,
            NodeStatus::Recovered => 0.0,
        };
    }
}
