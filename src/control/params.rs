use super::protocol::Algorithm;

/// Settings a session is initialized with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionParams {
	/// Inference algorithm.
	pub algorithm: Algorithm,
	/// Particles sampled on `init`.
	pub particle_count: u32,
	/// Number of `update` steps in the run.
	pub iteration_budget: u32,
}

/// Staged configuration edited by the user.
///
/// Edits never touch a running session; they are picked up by the next
/// initialize. Range checks belong to the sliders feeding this store.
#[derive(Clone, Debug)]
pub struct ParameterStore {
	staged: SessionParams,
}

impl ParameterStore {
	pub fn new(defaults: SessionParams) -> Self {
		Self { staged: defaults }
	}

	pub fn set_algorithm(&mut self, algorithm: Algorithm) {
		self.staged.algorithm = algorithm;
	}

	pub fn set_particle_count(&mut self, n: u32) {
		self.staged.particle_count = n;
	}

	pub fn set_iteration_budget(&mut self, n: u32) {
		self.staged.iteration_budget = n;
	}

	pub fn staged(&self) -> SessionParams {
		self.staged
	}
}
