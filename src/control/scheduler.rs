use log::{debug, info};

use super::connection::ConnectionManager;
use super::effect::{Effects, Timer, TimerKind};
use super::error::ControlError;
use super::params::SessionParams;
use super::protocol::OutboundMessage;
use super::session::{Phase, Session};
use super::sync::StateSynchronizer;

/// Paces `update` requests so at most one is unanswered at a time.
///
/// Each pacing tick polls the synchronizer's pending flag instead of reacting to
/// the reply directly; a tick that finds no reply is a no-op.
#[derive(Debug)]
pub struct IterationScheduler {
	pacing: Timer,
	// survives a dropped connection, cleared when the run completes
	started: bool,
}

impl IterationScheduler {
	pub fn new(period_ms: u32) -> Self {
		Self {
			pacing: Timer::new(TimerKind::Pacing, period_ms),
			started: false,
		}
	}

	pub fn is_ticking(&self) -> bool {
		self.pacing.is_active()
	}

	/// Reset `session` to a fresh run and ask the backend to initialize it.
	pub fn initialize(
		&mut self,
		session: &mut Session,
		params: SessionParams,
		conn: &ConnectionManager,
		sync: &mut StateSynchronizer,
		fx: &mut Effects,
	) -> Result<(), ControlError> {
		if !conn.is_open() {
			return Err(ControlError::InvalidOperation("initialize while disconnected"));
		}
		self.pacing.cancel(fx);
		self.started = false;
		session.rearm(params);
		// the init reply is what releases the first update. Replies still owed
		// for the previous run stay owed, so they cannot release it early.
		sync.clear_pending();
		info!(
			"initializing {} with {} particles, {} iterations",
			params.algorithm, params.particle_count, params.iteration_budget
		);
		conn.send(
			&OutboundMessage::Init {
				algo: params.algorithm,
				num_particles: params.particle_count,
			},
			fx,
		)?;
		sync.expect_reply();
		Ok(())
	}

	pub fn start(
		&mut self,
		session: &Session,
		conn: &ConnectionManager,
		fx: &mut Effects,
	) -> Result<(), ControlError> {
		if session.phase != Phase::Running {
			return Err(ControlError::InvalidOperation("start outside a running session"));
		}
		if self.started {
			return Err(ControlError::InvalidOperation("start while already stepping"));
		}
		self.started = true;
		if conn.is_open() {
			self.pacing.start(fx);
		}
		Ok(())
	}

	/// One pacing tick.
	pub fn request_update(
		&mut self,
		session: &mut Session,
		conn: &ConnectionManager,
		sync: &mut StateSynchronizer,
		fx: &mut Effects,
	) -> Result<(), ControlError> {
		if !self.pacing.is_active() || session.phase != Phase::Running {
			return Ok(());
		}
		if !sync.has_pending() && !session.budget_reached() {
			debug!("tick: waiting on iteration {}", session.iterations_completed);
			return Ok(());
		}

		conn.send(
			&OutboundMessage::Update {
				num_iters: session.remaining(),
			},
			fx,
		)?;
		sync.expect_reply();
		session.iterations_completed += 1;
		sync.clear_pending();
		debug!(
			"requested iteration {}/{}",
			session.iterations_completed, session.iteration_budget
		);

		if session.budget_reached() {
			self.pacing.cancel(fx);
			self.started = false;
			session.phase = Phase::Complete;
			info!("run complete after {} iterations", session.iterations_completed);
		}
		Ok(())
	}

	pub fn request_estimate(
		&self,
		session: &Session,
		conn: &ConnectionManager,
		sync: &mut StateSynchronizer,
		fx: &mut Effects,
	) -> Result<(), ControlError> {
		if session.phase != Phase::Complete {
			return Err(ControlError::InvalidOperation("estimate before the run completed"));
		}
		conn.send(&OutboundMessage::Estimate, fx)?;
		sync.expect_reply();
		Ok(())
	}

	/// Stop ticking while the socket is down. The run stays started.
	pub fn suspend(&mut self, fx: &mut Effects) {
		if self.pacing.is_active() {
			debug!("pacing suspended");
		}
		self.pacing.cancel(fx);
	}

	/// Pick a started run back up on a fresh socket. Any reply owed on the old
	/// socket is lost with it, so the flag is raised to let the next step go.
	/// The caller has already told `sync` to forget those replies.
	pub fn resume(&mut self, session: &Session, sync: &mut StateSynchronizer, fx: &mut Effects) {
		if !self.started || session.phase != Phase::Running {
			return;
		}
		sync.mark_pending();
		if self.pacing.start(fx) {
			info!(
				"resuming at iteration {}/{}",
				session.iterations_completed, session.iteration_budget
			);
		}
	}

	/// Stop for good.
	pub fn halt(&mut self, fx: &mut Effects) {
		self.pacing.cancel(fx);
		self.started = false;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::control::effect::Effect;
	use crate::control::protocol::Algorithm;

	const REPLY: &str = r#"{"circles": []}"#;

	struct Rig {
		conn: ConnectionManager,
		sync: StateSynchronizer,
		session: Session,
		sched: IterationScheduler,
	}

	fn params(budget: u32) -> SessionParams {
		SessionParams {
			algorithm: Algorithm::ParticleFilter,
			particle_count: 50,
			iteration_budget: budget,
		}
	}

	fn rig(budget: u32) -> Rig {
		let mut conn = ConnectionManager::new("ws://test/bp".into(), 1000);
		let mut fx = Effects::default();
		conn.connect(&mut fx);
		let Some(Effect::Open { id, .. }) = fx.into_vec().pop() else {
			panic!("no socket");
		};
		conn.on_open(id, &mut Effects::default());
		Rig {
			conn,
			sync: StateSynchronizer::new(0),
			session: Session::new(params(budget)),
			sched: IterationScheduler::new(100),
		}
	}

	fn sends(fx: Effects) -> Vec<String> {
		fx.into_vec()
			.into_iter()
			.filter_map(|e| match e {
				Effect::Send { text, .. } => Some(text),
				_ => None,
			})
			.collect()
	}

	impl Rig {
		fn init(&mut self, budget: u32) -> Effects {
			let mut fx = Effects::default();
			self.sched
				.initialize(&mut self.session, params(budget), &self.conn, &mut self.sync, &mut fx)
				.unwrap();
			fx
		}

		fn tick(&mut self) -> Vec<String> {
			let mut fx = Effects::default();
			self.sched
				.request_update(&mut self.session, &self.conn, &mut self.sync, &mut fx)
				.unwrap();
			sends(fx)
		}
	}

	#[test]
	fn start_is_refused_before_initialize() {
		let mut r = rig(3);
		let mut fx = Effects::default();
		assert!(r.sched.start(&r.session, &r.conn, &mut fx).is_err());
		assert!(fx.into_vec().is_empty());
	}

	#[test]
	fn ticks_wait_for_each_reply() {
		let mut r = rig(3);
		let sent = sends(r.init(3));
		assert_eq!(sent.len(), 1);
		assert!(sent[0].contains("\"init\""));
		r.sched.start(&r.session, &r.conn, &mut Effects::default()).unwrap();

		// init reply not in yet
		assert!(r.tick().is_empty());
		r.sync.on_message(REPLY).unwrap();
		let sent = r.tick();
		assert_eq!(sent.len(), 1);
		assert!(sent[0].contains("\"num_iters\":3"));
		assert!(r.tick().is_empty());
		assert_eq!(r.session.iterations_completed, 1);
	}

	#[test]
	fn run_completes_and_stops_pacing() {
		let mut r = rig(2);
		r.init(2);
		r.sched.start(&r.session, &r.conn, &mut Effects::default()).unwrap();
		for _ in 0..2 {
			r.sync.on_message(REPLY).unwrap();
			assert_eq!(r.tick().len(), 1);
		}
		assert_eq!(r.session.phase, Phase::Complete);
		assert!(!r.sched.is_ticking());

		r.sync.on_message(REPLY).unwrap();
		assert!(r.tick().is_empty());
		assert!(r.sched.start(&r.session, &r.conn, &mut Effects::default()).is_err());
	}

	#[test]
	fn estimate_only_after_completion() {
		let mut r = rig(1);
		r.init(1);
		let mut fx = Effects::default();
		assert!(r.sched.request_estimate(&r.session, &r.conn, &mut r.sync, &mut fx).is_err());
		assert!(fx.into_vec().is_empty());

		r.sched.start(&r.session, &r.conn, &mut Effects::default()).unwrap();
		r.sync.on_message(REPLY).unwrap();
		r.tick();

		for _ in 0..2 {
			let mut fx = Effects::default();
			r.sched.request_estimate(&r.session, &r.conn, &mut r.sync, &mut fx).unwrap();
			assert_eq!(sends(fx), vec![r#"{"action":"estimate"}"#.to_string()]);
		}
	}

	#[test]
	fn reinitialize_cancels_pacing_and_resets_progress() {
		let mut r = rig(5);
		r.init(5);
		r.sched.start(&r.session, &r.conn, &mut Effects::default()).unwrap();
		r.sync.on_message(REPLY).unwrap();
		r.tick();

		let fx = r.init(8).into_vec();
		assert!(fx.contains(&Effect::CancelTimer {
			timer: TimerKind::Pacing
		}));
		assert_eq!(r.session.iterations_completed, 0);
		assert_eq!(r.session.iteration_budget, 8);
		assert_eq!(r.session.phase, Phase::Running);
		assert!(!r.sched.started);
	}

	#[test]
	fn late_reply_from_previous_run_does_not_release_an_update() {
		let mut r = rig(5);
		r.init(5);
		r.sched.start(&r.session, &r.conn, &mut Effects::default()).unwrap();
		r.sync.on_message(REPLY).unwrap();
		assert_eq!(r.tick().len(), 1);

		// re-initialize while that update is still unanswered
		r.init(5);
		r.sched.start(&r.session, &r.conn, &mut Effects::default()).unwrap();
		r.sync.on_message(REPLY).unwrap();
		assert!(r.tick().is_empty());

		r.sync.on_message(REPLY).unwrap();
		let sent = r.tick();
		assert_eq!(sent.len(), 1);
		assert!(sent[0].contains("\"num_iters\":5"));
		assert!(r.tick().is_empty());
	}

	#[test]
	fn resume_releases_the_lost_reply() {
		let mut r = rig(4);
		r.init(4);
		r.sched.start(&r.session, &r.conn, &mut Effects::default()).unwrap();
		r.sync.on_message(REPLY).unwrap();
		r.tick();

		r.sched.suspend(&mut Effects::default());
		assert!(!r.sched.is_ticking());
		assert!(r.sched.started);

		let mut fx = Effects::default();
		r.sync.forget_replies();
		r.sched.resume(&r.session, &mut r.sync, &mut fx);
		assert!(r.sched.is_ticking());
		assert_eq!(r.tick().len(), 1);
		assert_eq!(r.session.iterations_completed, 2);
	}
}
