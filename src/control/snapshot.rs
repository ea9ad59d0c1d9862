use serde::Deserialize;

use super::error::ControlError;

/// Number of named link collections (`l1` ..= `l8`) in a server frame.
pub const LINK_GROUPS: usize = 8;

/// A particle's root node, drawn as a disc.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "[f64; 3]")]
pub struct Circle {
	/// Centre x in canvas pixels.
	pub x: f64,
	/// Centre y in canvas pixels.
	pub y: f64,
	/// Radius in canvas pixels.
	pub r: f64,
}

impl From<[f64; 3]> for Circle {
	fn from([x, y, r]: [f64; 3]) -> Self {
		Self { x, y, r }
	}
}

/// One link of a particle, drawn as a rotated rectangle centred on `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "[f64; 5]")]
pub struct LinkRect {
	/// Centre x in canvas pixels.
	pub x: f64,
	/// Centre y in canvas pixels.
	pub y: f64,
	/// Rotation in radians.
	pub theta: f64,
	/// Extent along the link axis.
	pub width: f64,
	/// Extent across the link axis.
	pub height: f64,
}

impl From<[f64; 5]> for LinkRect {
	fn from([x, y, theta, width, height]: [f64; 5]) -> Self {
		Self {
			x,
			y,
			theta,
			width,
			height,
		}
	}
}

#[derive(Deserialize)]
struct WireSnapshot {
	circles: Vec<Option<Circle>>,
	#[serde(default)]
	l1: Option<Vec<Option<LinkRect>>>,
	#[serde(default)]
	l2: Option<Vec<Option<LinkRect>>>,
	#[serde(default)]
	l3: Option<Vec<Option<LinkRect>>>,
	#[serde(default)]
	l4: Option<Vec<Option<LinkRect>>>,
	#[serde(default)]
	l5: Option<Vec<Option<LinkRect>>>,
	#[serde(default)]
	l6: Option<Vec<Option<LinkRect>>>,
	#[serde(default)]
	l7: Option<Vec<Option<LinkRect>>>,
	#[serde(default)]
	l8: Option<Vec<Option<LinkRect>>>,
}

/// Render-ready state of the backend after its latest reply.
///
/// Index `i` refers to the same particle in every collection and `None` means the
/// entry is not drawn. Collections are not required to have equal lengths: a
/// short collection simply renders fewer shapes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
	circles: Vec<Option<Circle>>,
	links: [Vec<Option<LinkRect>>; LINK_GROUPS],
}

impl Snapshot {
	/// A snapshot with `len` empty slots in every collection.
	pub fn blank(len: usize) -> Self {
		Self {
			circles: vec![None; len],
			links: std::array::from_fn(|_| vec![None; len]),
		}
	}

	/// Decode a full server frame.
	pub fn parse(raw: &str) -> Result<Self, ControlError> {
		let wire: WireSnapshot = serde_json::from_str(raw)?;
		Ok(Self {
			circles: wire.circles,
			links: [
				wire.l1, wire.l2, wire.l3, wire.l4, wire.l5, wire.l6, wire.l7, wire.l8,
			]
			.map(Option::unwrap_or_default),
		})
	}

	/// Root discs, one slot per particle.
	pub fn circles(&self) -> &[Option<Circle>] {
		&self.circles
	}

	/// Link collection `group` (0-based, so `l1` is group 0).
	pub fn links(&self, group: usize) -> &[Option<LinkRect>] {
		self.links.get(group).map(Vec::as_slice).unwrap_or(&[])
	}

	/// All link collections in wire order.
	pub fn link_groups(&self) -> impl Iterator<Item = &[Option<LinkRect>]> {
		self.links.iter().map(Vec::as_slice)
	}

	/// Number of shapes that will actually be drawn.
	pub fn drawn_count(&self) -> usize {
		self.circles.iter().flatten().count()
			+ self
				.links
				.iter()
				.map(|group| group.iter().flatten().count())
				.sum::<usize>()
	}
}
