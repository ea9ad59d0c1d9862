use std::fmt;

/// Identity of one socket opened by the core.
///
/// Every transport event carries the id of the socket that raised it, so late
/// events from a replaced socket can be told apart from the live one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// The two interval timers the core runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
	/// Scheduler tick that may issue the next `update`.
	Pacing,
	/// Reconnection attempt while the socket is closed.
	Reconnect,
}

/// Work the host must carry out on behalf of the core, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
	/// Open a socket and report its events under `id`.
	Open {
		/// Id the host tags this socket's events with.
		id: ConnectionId,
		/// Backend URL.
		endpoint: String,
	},
	/// Send a text frame.
	Send {
		/// Socket to send on.
		id: ConnectionId,
		/// Encoded JSON record.
		text: String,
	},
	/// Close a socket. No further events for it are needed.
	Close {
		/// Socket to close.
		id: ConnectionId,
	},
	/// Start a repeating timer; ticks come back as `Event::Tick(timer)`.
	StartTimer {
		/// Which timer.
		timer: TimerKind,
		/// Tick period.
		period_ms: u32,
	},
	/// Stop a repeating timer.
	CancelTimer {
		/// Which timer.
		timer: TimerKind,
	},
}

/// Ordered buffer of effects produced while handling one event.
#[derive(Debug, Default)]
pub struct Effects(Vec<Effect>);

impl Effects {
	pub fn push(&mut self, effect: Effect) {
		self.0.push(effect);
	}

	pub fn into_vec(self) -> Vec<Effect> {
		self.0
	}
}

/// Bookkeeping for one repeating timer, so start and cancel stay idempotent.
#[derive(Debug)]
pub struct Timer {
	kind: TimerKind,
	period_ms: u32,
	active: bool,
}

impl Timer {
	pub fn new(kind: TimerKind, period_ms: u32) -> Self {
		Self {
			kind,
			period_ms,
			active: false,
		}
	}

	pub fn is_active(&self) -> bool {
		self.active
	}

	/// Returns false when the timer was already running.
	pub fn start(&mut self, fx: &mut Effects) -> bool {
		if self.active {
			return false;
		}
		self.active = true;
		fx.push(Effect::StartTimer {
			timer: self.kind,
			period_ms: self.period_ms,
		});
		true
	}

	pub fn cancel(&mut self, fx: &mut Effects) {
		if !self.active {
			return;
		}
		self.active = false;
		fx.push(Effect::CancelTimer { timer: self.kind });
	}
}
