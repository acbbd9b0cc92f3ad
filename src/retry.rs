//! Failure classification and backoff for a single logical request.
//!
//! [`RetryPolicy::decide`] is a pure function of the attempt index and the attempt's
//! [`Outcome`], so every branch of the decision table can be tested without a network.

// self
use crate::{_prelude::*, error::TransportError, http::ApiResponse};

/// Statuses retried without touching the token.
pub const RETRYABLE_STATUSES: [u16; 4] = [429, 502, 503, 504];

/// What a single attempt produced.
#[derive(Clone, Copy, Debug)]
pub enum Outcome<'a> {
	/// The transport failed before any response arrived.
	Transport(&'a TransportError),
	/// The server answered, with any status.
	Response(&'a ApiResponse),
}
impl Outcome<'_> {
	/// HTTP status of the outcome, if a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transport(_) => None,
			Self::Response(response) => Some(response.status),
		}
	}
}

/// Per-logical-request retry bookkeeping; created fresh by each pipeline run.
#[derive(Clone, Copy, Debug)]
pub struct RetryState {
	/// 0-based index of the attempt in flight.
	pub attempt: u32,
	started_at: tokio::time::Instant,
}
impl RetryState {
	/// Starts tracking a new logical request at attempt 0.
	pub fn new() -> Self {
		Self { attempt: 0, started_at: tokio::time::Instant::now() }
	}

	/// Time spent on the logical request so far, sleeps included.
	pub fn elapsed(&self) -> Duration {
		Duration::try_from(self.started_at.elapsed()).unwrap_or(Duration::MAX)
	}

	/// Moves on to the next attempt.
	pub fn advance(&mut self) {
		self.attempt = self.attempt.saturating_add(1);
	}
}
impl Default for RetryState {
	fn default() -> Self {
		Self::new()
	}
}

/// Decision returned by [`RetryPolicy::decide`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
	/// Resend the same request after the given delay.
	RetryImmediately(Duration),
	/// Refresh the bearer token, then resend without delay.
	RetryAfterRefresh,
	/// Stop and hand the outcome back to the caller.
	GiveUp,
}

/// Retry ceiling, refresh ceiling, and linear backoff step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
	/// Attempt index at which the policy stops retrying unconditionally.
	pub max_attempts: u32,
	/// Highest attempt index at which a 401 still triggers a token refresh.
	pub max_refresh_attempt: u32,
	/// Backoff added per attempt for connection errors and 5xx gateway statuses.
	pub backoff_step: Duration,
}
impl RetryPolicy {
	/// Default retry ceiling.
	pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
	/// Default refresh ceiling; attempts 0 and 1 may refresh.
	pub const DEFAULT_MAX_REFRESH_ATTEMPT: u32 = 1;
	/// Default linear backoff step.
	pub const DEFAULT_BACKOFF_STEP: Duration = Duration::seconds(1);

	/// Classifies the outcome of attempt `attempt` (0-based, before incrementing).
	pub fn decide(&self, attempt: u32, outcome: Outcome<'_>) -> RetryDecision {
		if attempt >= self.max_attempts {
			return RetryDecision::GiveUp;
		}

		match outcome.status() {
			None => RetryDecision::RetryImmediately(self.delay(attempt, None)),
			Some(status) if RETRYABLE_STATUSES.contains(&status) =>
				RetryDecision::RetryImmediately(self.delay(attempt, Some(status))),
			Some(401) if attempt <= self.max_refresh_attempt => RetryDecision::RetryAfterRefresh,
			Some(_) => RetryDecision::GiveUp,
		}
	}

	/// Backoff before resending attempt `attempt`.
	///
	/// 401 and 429 resend at once: the token fix or the rate limiter's next prediction is the
	/// remedy, not time. Everything else backs off linearly from zero.
	pub fn delay(&self, attempt: u32, status: Option<u16>) -> Duration {
		match status {
			Some(401 | 429) => Duration::ZERO,
			_ => self.backoff_step.saturating_mul(i32::try_from(attempt).unwrap_or(i32::MAX)),
		}
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
			max_refresh_attempt: Self::DEFAULT_MAX_REFRESH_ATTEMPT,
			backoff_step: Self::DEFAULT_BACKOFF_STEP,
		}
	}
}
