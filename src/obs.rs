//! Optional observability helpers for the request pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit a `ls_api.request` span per logical request
//!   with `method` and `path` fields, plus events for throttling, retries, give-ups, and
//!   token refreshes. Tokens only ever appear as an eight-character preview.
//! - Enable `metrics` to increment the `ls_api_request_total` counter, labeled by `method` +
//!   `outcome`, and the `ls_api_token_refresh_total` counter, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each logical request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// A request was put on the wire.
	Attempt,
	/// The pipeline scheduled a resend.
	Retry,
	/// The pipeline refreshed the token before resending.
	Refresh,
	/// The pipeline returned a response to the caller.
	Success,
	/// The pipeline returned an error to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Retry => "retry",
			RequestOutcome::Refresh => "refresh",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
