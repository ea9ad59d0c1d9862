use super::error::ControlError;
use super::params::SessionParams;
use super::protocol::Algorithm;

/// Backend address of the reference deployment.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/bp";
/// Interval between scheduler ticks.
pub const PACING_PERIOD_MS: u32 = 100;
/// Interval between reconnection attempts.
pub const RECONNECT_PERIOD_MS: u32 = 1000;

/// Bounds of a discrete slider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliderRange {
	/// Smallest selectable value.
	pub min: u32,
	/// Largest selectable value.
	pub max: u32,
	/// Distance between marks.
	pub step: u32,
	/// Initial position.
	pub default: u32,
}

impl SliderRange {
	/// Snap `value` onto the slider's grid.
	pub fn clamp(&self, value: u32) -> u32 {
		let value = value.clamp(self.min, self.max);
		let offset = value - self.min;
		self.min + (offset + self.step / 2) / self.step * self.step
	}
}

/// Particle count slider.
pub const PARTICLE_RANGE: SliderRange = SliderRange {
	min: 10,
	max: 500,
	step: 10,
	default: 50,
};

/// Iteration budget slider.
pub const ITERATION_RANGE: SliderRange = SliderRange {
	min: 5,
	max: 200,
	step: 5,
	default: 20,
};

/// Runtime settings of the control core.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlConfig {
	/// WebSocket URL of the inference backend.
	pub endpoint: String,
	/// Scheduler tick period.
	pub pacing_period_ms: u32,
	/// Reconnection retry period.
	pub reconnect_period_ms: u32,
	/// Parameters staged before the user touches anything.
	pub defaults: SessionParams,
}

impl Default for ControlConfig {
	fn default() -> Self {
		Self {
			endpoint: DEFAULT_ENDPOINT.into(),
			pacing_period_ms: PACING_PERIOD_MS,
			reconnect_period_ms: RECONNECT_PERIOD_MS,
			defaults: SessionParams {
				algorithm: Algorithm::ParticleFilter,
				particle_count: PARTICLE_RANGE.default,
				iteration_budget: ITERATION_RANGE.default,
			},
		}
	}
}

impl ControlConfig {
	/// Apply overrides from a URL query string such as `?backend=ws://host:9000/bp&pacing_ms=50`.
	///
	/// Values may be percent-encoded the way browsers send them. Unknown keys are
	/// skipped. The first bad value aborts and leaves `self` partially updated only
	/// with the keys before it.
	pub fn apply_query(&mut self, query: &str) -> Result<(), ControlError> {
		let query = query.strip_prefix('?').unwrap_or(query);
		for pair in query.split('&').filter(|p| !p.is_empty()) {
			let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
			if !matches!(key, "backend" | "pacing_ms" | "reconnect_ms") {
				continue;
			}
			let value = percent_decode(raw).ok_or_else(|| invalid(key, raw))?;
			match key {
				"backend" => self.endpoint = parse_endpoint(key, &value)?,
				"pacing_ms" => self.pacing_period_ms = parse_period(key, &value)?,
				"reconnect_ms" => self.reconnect_period_ms = parse_period(key, &value)?,
				_ => {}
			}
		}
		Ok(())
	}
}

fn invalid(key: &str, value: &str) -> ControlError {
	ControlError::InvalidConfig {
		key: key.into(),
		value: value.into(),
	}
}

/// Undo `application/x-www-form-urlencoded` escaping. `None` on a broken escape
/// or bytes that are not UTF-8.
fn percent_decode(raw: &str) -> Option<String> {
	let mut out = Vec::with_capacity(raw.len());
	let mut bytes = raw.bytes();
	while let Some(b) = bytes.next() {
		match b {
			b'%' => {
				let hi = char::from(bytes.next()?).to_digit(16)?;
				let lo = char::from(bytes.next()?).to_digit(16)?;
				out.push((hi * 16 + lo) as u8);
			}
			b'+' => out.push(b' '),
			_ => out.push(b),
		}
	}
	String::from_utf8(out).ok()
}

fn parse_endpoint(key: &str, value: &str) -> Result<String, ControlError> {
	if value.starts_with("ws://") || value.starts_with("wss://") {
		Ok(value.into())
	} else {
		Err(invalid(key, value))
	}
}

fn parse_period(key: &str, value: &str) -> Result<u32, ControlError> {
	match value.trim().parse::<u32>() {
		Ok(ms) if ms > 0 => Ok(ms),
		_ => Err(invalid(key, value)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_reference_deployment() {
		let cfg = ControlConfig::default();
		assert_eq!(cfg.endpoint, "ws://localhost:8080/bp");
		assert_eq!(cfg.pacing_period_ms, 100);
		assert_eq!(cfg.reconnect_period_ms, 1000);
		assert_eq!(cfg.defaults.particle_count, 50);
		assert_eq!(cfg.defaults.iteration_budget, 20);
	}

	#[test]
	fn query_overrides_known_keys() {
		let mut cfg = ControlConfig::default();
		cfg.apply_query("?backend=wss://example.org/bp&pacing_ms=40&theme=dark")
			.unwrap();
		assert_eq!(cfg.endpoint, "wss://example.org/bp");
		assert_eq!(cfg.pacing_period_ms, 40);
		assert_eq!(cfg.reconnect_period_ms, RECONNECT_PERIOD_MS);
	}

	#[test]
	fn bad_values_are_reported() {
		let mut cfg = ControlConfig::default();
		let err = cfg.apply_query("reconnect_ms=0").unwrap_err();
		assert!(matches!(err, ControlError::InvalidConfig { ref key, .. } if key == "reconnect_ms"));
		assert!(cfg.apply_query("backend=http://nope").is_err());
		assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
	}

	#[test]
	fn encoded_values_are_decoded() {
		let mut cfg = ControlConfig::default();
		cfg.apply_query("?backend=ws%3A%2F%2Fhost%3A9000%2Fbp&reconnect_ms=%32%35%30")
			.unwrap();
		assert_eq!(cfg.endpoint, "ws://host:9000/bp");
		assert_eq!(cfg.reconnect_period_ms, 250);

		let err = cfg.apply_query("pacing_ms=5%G0").unwrap_err();
		assert!(matches!(err, ControlError::InvalidConfig { ref value, .. } if value == "5%G0"));
	}

	#[test]
	fn sliders_snap_to_grid() {
		assert_eq!(PARTICLE_RANGE.clamp(3), 10);
		assert_eq!(PARTICLE_RANGE.clamp(44), 40);
		assert_eq!(PARTICLE_RANGE.clamp(45), 50);
		assert_eq!(ITERATION_RANGE.clamp(1000), 200);
	}
}
