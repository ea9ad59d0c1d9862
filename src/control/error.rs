use thiserror::Error;

/// Faults raised inside the control core.
///
/// None of these cross into the presentation layer: the [`Controller`](super::Controller)
/// logs them and carries on.
#[derive(Debug, Error)]
pub enum ControlError {
	/// The socket is not open, so the message was dropped.
	#[error("connection is not open")]
	TransportClosed,
	/// An inbound frame could not be decoded into a snapshot.
	#[error("malformed server message: {0}")]
	MalformedMessage(#[from] serde_json::Error),
	/// An intent arrived in a state where it has no meaning.
	#[error("ignored {0}")]
	InvalidOperation(&'static str),
	/// A configuration override could not be parsed.
	#[error("invalid value {value:?} for `{key}`")]
	InvalidConfig {
		/// Query key that carried the value.
		key: String,
		/// The rejected value.
		value: String,
	},
}
