//! Local leaky-bucket model used to throttle requests before the server has to.
//!
//! The server reports its bucket after every response via [`BUCKET_LEVEL_HEADER`]
//! (`"<level>/<size>"`) and [`DRIP_RATE_HEADER`] (units drained per second). The
//! [`RateLimiter`] keeps the last report and predicts how long a request of a given cost
//! should wait. The prediction is best effort; the server stays authoritative and any
//! under-prediction shows up as a 429 that the retry policy handles.

// crates.io
use tokio::time::Instant;
// self
use crate::{_prelude::*, http::ApiResponse, obs};

/// Header carrying the bucket fill level as `"<level>/<size>"`.
pub const BUCKET_LEVEL_HEADER: &str = "X-LS-API-Bucket-Level";
/// Header carrying the drip (drain) rate in units per second.
pub const DRIP_RATE_HEADER: &str = "X-LS-API-Drip-Rate";

/// Snapshot of the server's leaky bucket as last observed.
///
/// Timestamps come from the same monotonic clock the pipeline sleeps on, so a wall-clock
/// step never shortens or stretches a predicted wait.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateBucket {
	/// Units currently in the bucket.
	pub level: f64,
	/// Bucket capacity.
	pub size: f64,
	/// Units drained per second.
	pub drip: f64,
	/// When the client last heard back from (or failed to reach) the server; `None` before
	/// the first attempt.
	pub last_request_at: Option<Instant>,
}
impl RateBucket {
	/// Bucket capacity assumed before the first report.
	pub const DEFAULT_SIZE: f64 = 60.;
	/// Drip rate assumed before the first report.
	pub const DEFAULT_DRIP: f64 = 1.;

	/// Creates a bucket snapshot.
	pub fn new(level: f64, size: f64, drip: f64, last_request_at: Option<Instant>) -> Self {
		Self { level, size, drip, last_request_at }
	}

	/// Remaining budget, clamped at zero when the server reports an over-full bucket.
	pub fn available(&self) -> f64 {
		(self.size - self.level).max(0.)
	}
}
impl Default for RateBucket {
	fn default() -> Self {
		Self::new(0., Self::DEFAULT_SIZE, Self::DEFAULT_DRIP, None)
	}
}

/// Thread-safe bucket tracker shared by every request issued through one client.
#[derive(Debug)]
pub struct RateLimiter {
	bucket: Mutex<RateBucket>,
	max_wait: Duration,
}
impl RateLimiter {
	/// Upper bound applied to every predicted wait unless configured otherwise.
	pub const DEFAULT_MAX_WAIT: Duration = Duration::seconds(60);

	/// Creates a limiter seeded with [`RateBucket::default`].
	pub fn new(max_wait: Duration) -> Self {
		Self::with_bucket(RateBucket::default(), max_wait)
	}

	/// Creates a limiter seeded with a known bucket state.
	pub fn with_bucket(bucket: RateBucket, max_wait: Duration) -> Self {
		let max_wait = if max_wait.is_negative() { Duration::ZERO } else { max_wait };

		Self { bucket: Mutex::new(bucket), max_wait }
	}

	/// Returns a copy of the current bucket state.
	pub fn snapshot(&self) -> RateBucket {
		*self.bucket.lock()
	}

	/// Predicts how long a request costing `cost` units should wait before being sent.
	pub fn wait_duration(&self, cost: u32) -> Duration {
		self.wait_duration_at(cost, Instant::now())
	}

	/// [`wait_duration`](Self::wait_duration) evaluated at an explicit instant.
	///
	/// The drain time is compared with the time elapsed since the last request before
	/// `max_wait` caps what is returned.
	pub fn wait_duration_at(&self, cost: u32, now: Instant) -> Duration {
		let bucket = self.snapshot();
		let overflow = f64::from(cost) - bucket.available();

		if overflow <= 0. {
			return Duration::ZERO;
		}
		// A bucket that never drains cannot be waited out; cap instead of sleeping forever.
		if !(bucket.drip.is_finite() && bucket.drip > 0.) {
			return self.max_wait;
		}

		let proposed_secs = overflow / bucket.drip;
		let elapsed_secs = match bucket.last_request_at {
			Some(last) => now.saturating_duration_since(last).as_secs_f64(),
			None => f64::INFINITY,
		};

		if proposed_secs <= elapsed_secs {
			Duration::ZERO
		} else if proposed_secs >= self.max_wait.as_seconds_f64() {
			self.max_wait
		} else {
			Duration::seconds_f64(proposed_secs)
		}
	}

	/// Updates the bucket from the server's headers and records the response time.
	pub fn observe(&self, response: &ApiResponse) {
		self.observe_at(response, Instant::now());
	}

	/// [`observe`](Self::observe) evaluated at an explicit instant.
	pub fn observe_at(&self, response: &ApiResponse, now: Instant) {
		let level = response.header(BUCKET_LEVEL_HEADER).and_then(|raw| {
			let parsed = parse_bucket_level(raw);

			if parsed.is_none() {
				obs::malformed_header(BUCKET_LEVEL_HEADER, raw);
			}

			parsed
		});
		let drip = response.header(DRIP_RATE_HEADER).and_then(|raw| {
			let parsed = parse_drip_rate(raw);

			if parsed.is_none() {
				obs::malformed_header(DRIP_RATE_HEADER, raw);
			}

			parsed
		});
		let mut bucket = self.bucket.lock();

		if let Some((level, size)) = level {
			bucket.level = level;
			bucket.size = size;

			if let Some(drip) = drip {
				bucket.drip = drip;
			}
		}

		bucket.last_request_at = Some(now);
	}

	/// Records that a request went out without producing a response.
	pub fn touch(&self) {
		self.touch_at(Instant::now());
	}

	/// [`touch`](Self::touch) evaluated at an explicit instant.
	pub fn touch_at(&self, now: Instant) {
		self.bucket.lock().last_request_at = Some(now);
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		Self::new(Self::DEFAULT_MAX_WAIT)
	}
}

fn parse_bucket_level(raw: &str) -> Option<(f64, f64)> {
	let (level, size) = raw.split_once('/')?;
	let level = level.trim().parse::<f64>().ok()?;
	let size = size.trim().parse::<f64>().ok()?;

	(level.is_finite() && size.is_finite() && level >= 0. && size > 0.).then_some((level, size))
}

fn parse_drip_rate(raw: &str) -> Option<f64> {
	let drip = raw.trim().parse::<f64>().ok()?;

	(drip.is_finite() && drip >= 0.).then_some(drip)
}
