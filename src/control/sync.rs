use log::debug;

use super::error::ControlError;
use super::snapshot::Snapshot;

/// Turns server frames into the current [`Snapshot`] and tells the scheduler
/// when every reply it is owed has arrived.
#[derive(Debug, Default)]
pub struct StateSynchronizer {
	snapshot: Snapshot,
	pending: bool,
	// requests sent on the current socket that have not been answered yet
	owed: u32,
	received: u64,
}

impl StateSynchronizer {
	pub fn new(slots: usize) -> Self {
		Self {
			snapshot: Snapshot::blank(slots),
			..Self::default()
		}
	}

	/// Replace the snapshot with the frame in `raw`. The pending flag only goes
	/// up once nothing else is owed. A bad frame leaves everything as it was.
	pub fn on_message(&mut self, raw: &str) -> Result<(), ControlError> {
		let snapshot = Snapshot::parse(raw)?;
		self.received += 1;
		self.owed = self.owed.saturating_sub(1);
		debug!(
			"frame {} with {} shapes, {} replies still owed",
			self.received,
			snapshot.drawn_count(),
			self.owed
		);
		self.snapshot = snapshot;
		self.pending = self.owed == 0;
		Ok(())
	}

	/// Note a request that the backend will answer with one frame.
	pub fn expect_reply(&mut self) {
		self.owed += 1;
	}

	/// A new socket owes nothing.
	pub fn forget_replies(&mut self) {
		self.owed = 0;
	}

	pub fn snapshot(&self) -> &Snapshot {
		&self.snapshot
	}

	#[cfg(test)]
	pub fn received(&self) -> u64 {
		self.received
	}

	pub fn has_pending(&self) -> bool {
		self.pending
	}

	pub fn mark_pending(&mut self) {
		self.pending = true;
	}

	pub fn clear_pending(&mut self) {
		self.pending = false;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const FRAME: &str = r#"{"circles": [[1, 2, 3]]}"#;

	#[test]
	fn good_frame_replaces_snapshot_and_flags_pending() {
		let mut sync = StateSynchronizer::new(50);
		assert_eq!(sync.snapshot().circles().len(), 50);
		assert!(!sync.has_pending());

		sync.on_message(FRAME).unwrap();
		assert!(sync.has_pending());
		assert_eq!(sync.snapshot().circles().len(), 1);
		assert_eq!(sync.received(), 1);
	}

	#[test]
	fn bad_frame_changes_nothing() {
		let mut sync = StateSynchronizer::new(0);
		sync.on_message(FRAME).unwrap();
		sync.clear_pending();
		let before = sync.snapshot().clone();

		assert!(sync.on_message("{\"circles\": 7").is_err());
		assert!(!sync.has_pending());
		assert_eq!(sync.snapshot(), &before);
		assert_eq!(sync.received(), 1);
	}

	#[test]
	fn pending_waits_for_every_owed_reply() {
		let mut sync = StateSynchronizer::new(0);
		sync.expect_reply();
		sync.expect_reply();

		sync.on_message(FRAME).unwrap();
		assert!(!sync.has_pending());
		assert_eq!(sync.snapshot().circles().len(), 1);
		sync.on_message(FRAME).unwrap();
		assert!(sync.has_pending());

		// unsolicited frames still count as news
		sync.clear_pending();
		sync.on_message(FRAME).unwrap();
		assert!(sync.has_pending());

		sync.expect_reply();
		sync.forget_replies();
		sync.clear_pending();
		sync.on_message(FRAME).unwrap();
		assert!(sync.has_pending());
	}
}
