use log::{debug, warn};

use super::config::ControlConfig;
use super::connection::{ConnectionManager, ConnectionState};
use super::effect::{ConnectionId, Effect, Effects, TimerKind};
use super::error::ControlError;
use super::params::{ParameterStore, SessionParams};
use super::protocol::Algorithm;
use super::scheduler::IterationScheduler;
use super::session::{Phase, Session};
use super::snapshot::Snapshot;
use super::sync::StateSynchronizer;

/// Something the user asked for through the panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
	/// Open the backend socket (also revives it after a shutdown).
	Connect,
	/// Start a fresh run with the staged parameters.
	Initialize,
	/// Begin stepping the initialized run.
	Start,
	/// Request the final estimate of a completed run.
	Estimate,
	/// Stage an algorithm for the next run.
	SetAlgorithm(Algorithm),
	/// Stage a particle count for the next run.
	SetParticleCount(u32),
	/// Stage an iteration budget for the next run.
	SetIterationBudget(u32),
	/// Tear everything down, e.g. on page unload.
	Shutdown,
}

/// Everything the core reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
	/// Socket handshake finished.
	Opened(ConnectionId),
	/// Socket closed.
	Closed(ConnectionId),
	/// Socket reported an error. Treated exactly like [`Event::Closed`].
	Errored(ConnectionId),
	/// Text frame received.
	Message(ConnectionId, String),
	/// A timer started through [`Effect::StartTimer`] fired.
	Tick(TimerKind),
	/// User input.
	Intent(Intent),
}

/// Read-only projection for status displays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlView {
	/// Socket status for the badge.
	pub connection: ConnectionState,
	/// Phase of the current run.
	pub phase: Phase,
	/// Updates issued in the current run.
	pub iterations_completed: u32,
	/// Budget of the current run, or the staged budget until the first initialize.
	pub iteration_budget: u32,
	/// Parameters the next initialize will use.
	pub staged: SessionParams,
	/// Whether the pacing timer is live.
	pub ticking: bool,
}

impl ControlView {
	/// Progress of the run as a whole percentage.
	pub fn progress_percent(&self) -> u32 {
		if self.iteration_budget == 0 {
			return 0;
		}
		let pct = 100.0 * f64::from(self.iterations_completed) / f64::from(self.iteration_budget);
		pct.round() as u32
	}
}

/// The control core: connection, scheduler, staged parameters and the latest
/// snapshot, driven one event at a time.
///
/// [`Controller::handle`] never fails. Faults are logged and absorbed, so the
/// worst a caller sees is a stalled run or a closed connection.
#[derive(Debug)]
pub struct Controller {
	connection: ConnectionManager,
	scheduler: IterationScheduler,
	params: ParameterStore,
	sync: StateSynchronizer,
	session: Option<Session>,
}

impl Controller {
	/// Build a controller. Nothing happens until [`Intent::Connect`] arrives.
	pub fn new(config: ControlConfig) -> Self {
		Self {
			connection: ConnectionManager::new(config.endpoint, config.reconnect_period_ms),
			scheduler: IterationScheduler::new(config.pacing_period_ms),
			params: ParameterStore::new(config.defaults),
			sync: StateSynchronizer::new(config.defaults.particle_count as usize),
			session: None,
		}
	}

	/// React to `event` and return the effects the host must run, in order.
	pub fn handle(&mut self, event: Event) -> Vec<Effect> {
		let mut fx = Effects::default();
		if let Err(err) = self.dispatch(event, &mut fx) {
			match err {
				ControlError::InvalidOperation(_) => debug!("{err}"),
				_ => warn!("{err}"),
			}
		}
		fx.into_vec()
	}

	fn dispatch(&mut self, event: Event, fx: &mut Effects) -> Result<(), ControlError> {
		match event {
			Event::Opened(id) => {
				if self.connection.on_open(id, fx) {
					let staged = self.params.staged();
					let session = self.session.get_or_insert_with(|| Session::new(staged));
					self.sync.forget_replies();
					self.scheduler.resume(session, &mut self.sync, fx);
				}
				Ok(())
			}
			Event::Closed(id) | Event::Errored(id) => {
				if self.connection.on_close(id, fx) {
					self.scheduler.suspend(fx);
				}
				Ok(())
			}
			Event::Message(id, raw) => {
				if !self.connection.is_live(id) {
					debug!("dropping frame from stale socket {id}");
					return Ok(());
				}
				self.sync.on_message(&raw)
			}
			Event::Tick(TimerKind::Reconnect) => {
				self.connection.on_retry_tick(fx);
				Ok(())
			}
			Event::Tick(TimerKind::Pacing) => match self.session.as_mut() {
				Some(session) => {
					self.scheduler
						.request_update(session, &self.connection, &mut self.sync, fx)
				}
				None => Ok(()),
			},
			Event::Intent(intent) => self.on_intent(intent, fx),
		}
	}

	fn on_intent(&mut self, intent: Intent, fx: &mut Effects) -> Result<(), ControlError> {
		match intent {
			Intent::Connect => {
				self.connection.connect(fx);
				Ok(())
			}
			Intent::Initialize => {
				let session = self
					.session
					.as_mut()
					.ok_or(ControlError::InvalidOperation("initialize before connecting"))?;
				self.scheduler.initialize(
					session,
					self.params.staged(),
					&self.connection,
					&mut self.sync,
					fx,
				)
			}
			Intent::Start => {
				let session = self
					.session
					.as_ref()
					.ok_or(ControlError::InvalidOperation("start before connecting"))?;
				self.scheduler.start(session, &self.connection, fx)
			}
			Intent::Estimate => {
				let session = self
					.session
					.as_ref()
					.ok_or(ControlError::InvalidOperation("estimate before connecting"))?;
				self.scheduler
					.request_estimate(session, &self.connection, &mut self.sync, fx)
			}
			Intent::SetAlgorithm(algorithm) => {
				self.params.set_algorithm(algorithm);
				Ok(())
			}
			Intent::SetParticleCount(n) => {
				self.params.set_particle_count(n);
				Ok(())
			}
			Intent::SetIterationBudget(n) => {
				self.params.set_iteration_budget(n);
				Ok(())
			}
			Intent::Shutdown => {
				self.scheduler.halt(fx);
				self.connection.shutdown(fx);
				Ok(())
			}
		}
	}

	/// Status for display.
	pub fn view(&self) -> ControlView {
		let staged = self.params.staged();
		let (phase, iterations_completed, iteration_budget) = match &self.session {
			Some(s) if s.phase != Phase::Idle => {
				(s.phase, s.iterations_completed, s.iteration_budget)
			}
			_ => (Phase::Idle, 0, staged.iteration_budget),
		};
		ControlView {
			connection: self.connection.state(),
			phase,
			iterations_completed,
			iteration_budget,
			staged,
			ticking: self.scheduler.is_ticking(),
		}
	}

	/// The latest snapshot from the backend.
	pub fn snapshot(&self) -> &Snapshot {
		self.sync.snapshot()
	}

	#[cfg(test)]
	fn frames_received(&self) -> u64 {
		self.sync.received()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const FRAME: &str = r#"{"circles": [[5, 5, 2]], "l1": [[0, 0, 0, 4, 2]]}"#;

	fn connected() -> (Controller, ConnectionId) {
		let mut ctl = Controller::new(ControlConfig::default());
		let fx = ctl.handle(Event::Intent(Intent::Connect));
		let [Effect::Open { id, .. }] = fx.as_slice() else {
			panic!("expected a single open, got {fx:?}");
		};
		let id = *id;
		ctl.handle(Event::Opened(id));
		(ctl, id)
	}

	fn sent(fx: &[Effect]) -> usize {
		fx.iter()
			.filter(|e| matches!(e, Effect::Send { .. }))
			.count()
	}

	#[test]
	fn session_appears_on_first_open() {
		let mut ctl = Controller::new(ControlConfig::default());
		assert!(ctl.handle(Event::Intent(Intent::Initialize)).is_empty());
		let (ctl, _) = connected();
		let view = ctl.view();
		assert_eq!(view.connection, ConnectionState::Open);
		assert_eq!(view.phase, Phase::Idle);
		assert_eq!(view.iteration_budget, 20);
	}

	#[test]
	fn idle_view_follows_the_staged_budget() {
		let (mut ctl, _) = connected();
		ctl.handle(Event::Intent(Intent::SetIterationBudget(35)));
		let view = ctl.view();
		assert_eq!(view.phase, Phase::Idle);
		assert_eq!(view.iteration_budget, 35);
		assert_eq!(view.progress_percent(), 0);
	}

	#[test]
	fn staged_edits_wait_for_the_next_initialize() {
		let (mut ctl, id) = connected();
		ctl.handle(Event::Intent(Intent::Initialize));
		ctl.handle(Event::Intent(Intent::Start));
		ctl.handle(Event::Message(id, FRAME.into()));

		ctl.handle(Event::Intent(Intent::SetIterationBudget(5)));
		ctl.handle(Event::Intent(Intent::SetAlgorithm(Algorithm::BeliefPropagation)));
		let view = ctl.view();
		assert_eq!(view.iteration_budget, 20);
		assert_eq!(view.staged.iteration_budget, 5);

		let fx = ctl.handle(Event::Intent(Intent::Initialize));
		let Some(Effect::Send { text, .. }) = fx.last() else {
			panic!("initialize sent nothing: {fx:?}");
		};
		assert!(text.contains("\"bp\""));
		assert_eq!(ctl.view().iteration_budget, 5);
	}

	#[test]
	fn malformed_frame_keeps_state() {
		let (mut ctl, id) = connected();
		ctl.handle(Event::Intent(Intent::Initialize));
		ctl.handle(Event::Message(id, FRAME.into()));
		let before = (ctl.view(), ctl.snapshot().clone());

		assert!(ctl.handle(Event::Message(id, "{oops".into())).is_empty());
		assert_eq!((ctl.view(), ctl.snapshot().clone()), before);
		assert_eq!(ctl.frames_received(), 1);
	}

	#[test]
	fn frames_from_a_replaced_socket_are_dropped() {
		let (mut ctl, first) = connected();
		ctl.handle(Event::Errored(first));
		ctl.handle(Event::Closed(first));
		let fx = ctl.handle(Event::Tick(TimerKind::Reconnect));
		let [Effect::Open { id: second, .. }] = fx.as_slice() else {
			panic!("expected reconnect, got {fx:?}");
		};
		let second = *second;
		ctl.handle(Event::Opened(second));

		ctl.handle(Event::Message(first, FRAME.into()));
		assert_eq!(ctl.frames_received(), 0);
		ctl.handle(Event::Message(second, FRAME.into()));
		assert_eq!(ctl.frames_received(), 1);
	}

	#[test]
	fn close_suspends_pacing_and_open_resumes_it() {
		let (mut ctl, id) = connected();
		ctl.handle(Event::Intent(Intent::Initialize));
		ctl.handle(Event::Intent(Intent::Start));
		assert!(ctl.view().ticking);

		let fx = ctl.handle(Event::Closed(id));
		assert!(fx.contains(&Effect::CancelTimer {
			timer: TimerKind::Pacing
		}));
		assert!(fx.contains(&Effect::StartTimer {
			timer: TimerKind::Reconnect,
			period_ms: 1000
		}));
		assert_eq!(sent(&ctl.handle(Event::Tick(TimerKind::Pacing))), 0);

		let fx = ctl.handle(Event::Tick(TimerKind::Reconnect));
		let [Effect::Open { id, .. }] = fx.as_slice() else {
			panic!("expected reconnect, got {fx:?}");
		};
		let fx = ctl.handle(Event::Opened(*id));
		assert!(fx.contains(&Effect::CancelTimer {
			timer: TimerKind::Reconnect
		}));
		assert!(ctl.view().ticking);
		assert_eq!(sent(&ctl.handle(Event::Tick(TimerKind::Pacing))), 1);
	}

	#[test]
	fn shutdown_stops_everything() {
		let (mut ctl, id) = connected();
		ctl.handle(Event::Intent(Intent::Initialize));
		ctl.handle(Event::Intent(Intent::Start));
		let fx = ctl.handle(Event::Intent(Intent::Shutdown));
		assert_eq!(
			fx,
			vec![
				Effect::CancelTimer {
					timer: TimerKind::Pacing
				},
				Effect::Close { id },
			]
		);
		assert!(ctl.handle(Event::Closed(id)).is_empty());
		assert_eq!(ctl.view().connection, ConnectionState::Closed);
	}

	#[test]
	fn progress_rounds_to_whole_percent() {
		let view = ControlView {
			connection: ConnectionState::Open,
			phase: Phase::Running,
			iterations_completed: 1,
			iteration_budget: 3,
			staged: ControlConfig::default().defaults,
			ticking: true,
		};
		assert_eq!(view.progress_percent(), 33);
	}
}
