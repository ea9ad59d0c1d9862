//! Session control for the remote inference backend.
//!
//! The core is plain state with no browser dependency. A host feeds it
//! [`Event`]s (socket activity, timer ticks, user intents) through
//! [`Controller::handle`] and performs the returned [`Effect`]s: opening and
//! closing the socket, sending frames, starting and cancelling interval timers.
//! Everything runs on one thread, one event at a time.

mod config;
mod connection;
mod controller;
mod effect;
mod error;
mod params;
mod protocol;
mod scheduler;
mod session;
mod snapshot;
mod sync;

pub use config::{
	ControlConfig, DEFAULT_ENDPOINT, ITERATION_RANGE, PACING_PERIOD_MS, PARTICLE_RANGE,
	RECONNECT_PERIOD_MS, SliderRange,
};
pub use connection::ConnectionState;
pub use controller::{ControlView, Controller, Event, Intent};
pub use effect::{ConnectionId, Effect, TimerKind};
pub use error::ControlError;
pub use params::SessionParams;
pub use protocol::{Algorithm, OutboundMessage};
pub use session::Phase;
pub use snapshot::{Circle, LINK_GROUPS, LinkRect, Snapshot};
