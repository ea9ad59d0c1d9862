use super::params::SessionParams;
use super::protocol::Algorithm;

/// Lifecycle of an inference run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
	/// No run has been initialized on this connection yet.
	#[default]
	Idle,
	/// Initialized; stepping once started.
	Running,
	/// Budget exhausted, estimate available.
	Complete,
}

/// The run the backend is currently working on.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
	pub algorithm: Algorithm,
	pub particle_count: u32,
	pub iteration_budget: u32,
	pub iterations_completed: u32,
	pub phase: Phase,
}

impl Session {
	pub fn new(params: SessionParams) -> Self {
		Self {
			algorithm: params.algorithm,
			particle_count: params.particle_count,
			iteration_budget: params.iteration_budget,
			iterations_completed: 0,
			phase: Phase::Idle,
		}
	}

	/// Replace the run with a fresh one built from `params`, ready to step.
	pub fn rearm(&mut self, params: SessionParams) {
		*self = Self {
			phase: Phase::Running,
			..Self::new(params)
		};
	}

	pub fn budget_reached(&self) -> bool {
		self.iterations_completed >= self.iteration_budget
	}

	/// Steps left, counting the one about to be requested.
	pub fn remaining(&self) -> u32 {
		self.iteration_budget.saturating_sub(self.iterations_completed)
	}
}
