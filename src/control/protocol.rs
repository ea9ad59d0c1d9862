use std::fmt;

use serde_json::{Value, json};

/// Inference algorithm the backend should run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
	/// Sequential importance resampling over the full particle set.
	#[default]
	ParticleFilter,
	/// Nonparametric belief propagation over the part graph.
	BeliefPropagation,
}

impl Algorithm {
	/// Every selectable algorithm, in menu order.
	pub const ALL: [Algorithm; 2] = [Algorithm::ParticleFilter, Algorithm::BeliefPropagation];

	/// Wire label sent in the `algo` field.
	pub fn label(self) -> &'static str {
		match self {
			Algorithm::ParticleFilter => "pf",
			Algorithm::BeliefPropagation => "bp",
		}
	}

	/// Human readable name for the selector.
	pub fn name(self) -> &'static str {
		match self {
			Algorithm::ParticleFilter => "Particle Filter",
			Algorithm::BeliefPropagation => "Belief Propagation",
		}
	}

	/// Inverse of [`Algorithm::label`].
	pub fn from_label(label: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|algo| algo.label() == label)
	}
}

impl fmt::Display for Algorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Requests the client sends to the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundMessage {
	/// Start a fresh inference run.
	Init {
		/// Algorithm to run.
		algo: Algorithm,
		/// Number of particles to sample.
		num_particles: u32,
	},
	/// Advance the run by one step.
	Update {
		/// Steps left in the budget, counting this one.
		num_iters: u32,
	},
	/// Ask for the final estimate of a finished run.
	Estimate,
}

impl OutboundMessage {
	/// Short name used in log lines.
	pub fn action(&self) -> &'static str {
		match self {
			OutboundMessage::Init { .. } => "init",
			OutboundMessage::Update { .. } => "update",
			OutboundMessage::Estimate => "estimate",
		}
	}

	/// JSON record as it appears on the wire.
	pub fn to_json(&self) -> Value {
		match self {
			OutboundMessage::Init {
				algo,
				num_particles,
			} => json!({
				"action": "init",
				"algo": algo.label(),
				"num_particles": num_particles,
			}),
			OutboundMessage::Update { num_iters } => json!({
				"action": "update",
				"num_iters": num_iters,
			}),
			OutboundMessage::Estimate => json!({ "action": "estimate" }),
		}
	}

	/// Text frame payload.
	pub fn encode(&self) -> String {
		self.to_json().to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn init_carries_label_and_particle_count() {
		let msg = OutboundMessage::Init {
			algo: Algorithm::BeliefPropagation,
			num_particles: 120,
		};
		let decoded: Value = serde_json::from_str(&msg.encode()).unwrap();
		assert_eq!(
			decoded,
			json!({"action": "init", "algo": "bp", "num_particles": 120})
		);
	}

	#[test]
	fn estimate_has_only_the_action() {
		let decoded: Value = serde_json::from_str(&OutboundMessage::Estimate.encode()).unwrap();
		assert_eq!(decoded, json!({"action": "estimate"}));
	}

	#[test]
	fn labels_round_trip_through_lookup() {
		for algo in Algorithm::ALL {
			assert_eq!(Algorithm::from_label(algo.label()), Some(algo));
		}
		assert_eq!(Algorithm::from_label("mcmc"), None);
	}
}
