use log::{debug, info};

use super::effect::{ConnectionId, Effect, Effects, Timer, TimerKind};
use super::error::ControlError;
use super::protocol::OutboundMessage;

/// Observable status of the backend socket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
	/// Handshake in flight.
	Connecting,
	/// Ready to carry messages.
	Open,
	/// No usable socket; a retry may be pending.
	#[default]
	Closed,
}

/// Owns the single logical connection to the backend and keeps it alive.
///
/// A clean close and a transport error are handled the same way: the state drops
/// to [`ConnectionState::Closed`] and one retry timer starts, ticking until an
/// attempt reaches [`ConnectionState::Open`].
#[derive(Debug)]
pub struct ConnectionManager {
	endpoint: String,
	state: ConnectionState,
	current: Option<ConnectionId>,
	next_id: u64,
	retry: Timer,
	stopped: bool,
}

impl ConnectionManager {
	pub fn new(endpoint: String, reconnect_period_ms: u32) -> Self {
		Self {
			endpoint,
			state: ConnectionState::Closed,
			current: None,
			next_id: 1,
			retry: Timer::new(TimerKind::Reconnect, reconnect_period_ms),
			stopped: false,
		}
	}

	pub fn state(&self) -> ConnectionState {
		self.state
	}

	pub fn is_open(&self) -> bool {
		self.state == ConnectionState::Open
	}

	fn is_current(&self, id: ConnectionId) -> bool {
		self.current == Some(id)
	}

	/// True when `id` is the open socket, the only one whose frames count.
	pub fn is_live(&self, id: ConnectionId) -> bool {
		self.is_open() && self.is_current(id)
	}

	/// Open a new socket unless one is already connecting or open.
	pub fn connect(&mut self, fx: &mut Effects) {
		if self.state != ConnectionState::Closed {
			debug!("connect ignored, socket is {:?}", self.state);
			return;
		}
		self.stopped = false;
		let id = ConnectionId(self.next_id);
		self.next_id += 1;
		self.current = Some(id);
		self.state = ConnectionState::Connecting;
		info!("connecting {id} to {}", self.endpoint);
		fx.push(Effect::Open {
			id,
			endpoint: self.endpoint.clone(),
		});
	}

	/// Queue `msg` on the live socket. Nothing is buffered while the socket is down.
	pub fn send(&self, msg: &OutboundMessage, fx: &mut Effects) -> Result<(), ControlError> {
		match self.current {
			Some(id) if self.is_open() => {
				debug!("sending {} on {id}", msg.action());
				fx.push(Effect::Send {
					id,
					text: msg.encode(),
				});
				Ok(())
			}
			_ => Err(ControlError::TransportClosed),
		}
	}

	/// Returns true when `id` is the live socket and it just became open.
	pub fn on_open(&mut self, id: ConnectionId, fx: &mut Effects) -> bool {
		if !self.is_current(id) || self.state != ConnectionState::Connecting {
			debug!("ignoring open for {id}");
			return false;
		}
		self.state = ConnectionState::Open;
		self.retry.cancel(fx);
		info!("connection {id} open");
		true
	}

	/// Handles both close and error. Returns true when the live socket left
	/// `Connecting` or `Open` as a result.
	pub fn on_close(&mut self, id: ConnectionId, fx: &mut Effects) -> bool {
		if !self.is_current(id) || self.state == ConnectionState::Closed {
			return false;
		}
		let was_open = self.is_open();
		self.state = ConnectionState::Closed;
		if was_open {
			info!("connection {id} closed");
		} else {
			debug!("connection attempt {id} failed");
		}
		if !self.stopped && self.retry.start(fx) {
			info!("reconnecting to {}", self.endpoint);
		}
		true
	}

	pub fn on_retry_tick(&mut self, fx: &mut Effects) {
		if !self.retry.is_active() {
			return;
		}
		self.connect(fx);
	}

	/// Close the socket for good. Only an explicit [`connect`](Self::connect) revives it.
	pub fn shutdown(&mut self, fx: &mut Effects) {
		self.stopped = true;
		self.retry.cancel(fx);
		if let Some(id) = self.current.take() {
			if self.state != ConnectionState::Closed {
				fx.push(Effect::Close { id });
			}
			info!("connection {id} shut down");
		}
		self.state = ConnectionState::Closed;
	}
}
