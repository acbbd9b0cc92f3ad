// self
use crate::{_prelude::*, error::AuthError, http::Method, retry::Outcome};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

const BODY_PREVIEW_CHARS: usize = 512;

/// A span wrapping one logical request.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the verb and the account-relative path.
	pub fn new(method: Method, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("ls_api.request", method = method.as_str(), path);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, path);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a predicted rate-limit wait before a send.
pub fn throttled(cost: u32, wait: Duration) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		cost,
		wait_ms = wait.whole_milliseconds() as u64,
		"Waiting for the bucket to drain."
	);

	#[cfg(not(feature = "tracing"))]
	let _ = (cost, wait);
}

/// Logs that attempt `attempt` is about to be sent.
pub fn sending(attempt: u32) {
	#[cfg(feature = "tracing")]
	tracing::debug!(attempt, "Sending request.");

	#[cfg(not(feature = "tracing"))]
	let _ = attempt;
}

/// Logs a scheduled resend along with what went wrong.
pub fn retrying(attempt: u32, outcome: &Outcome<'_>, delay: Duration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		attempt,
		delay_ms = delay.whole_milliseconds() as u64,
		detail = %describe(outcome),
		"Retrying request."
	);

	#[cfg(not(feature = "tracing"))]
	let _ = (attempt, outcome, delay);
}

/// Logs a 401 that triggers a token refresh.
pub fn refreshing(attempt: u32) {
	#[cfg(feature = "tracing")]
	tracing::info!(attempt, "Access token rejected; refreshing before retrying.");

	#[cfg(not(feature = "tracing"))]
	let _ = attempt;
}

/// Logs the pipeline giving up on an error outcome. Successful responses are not logged.
pub fn giving_up(attempt: u32, elapsed: Duration, outcome: &Outcome<'_>) {
	if matches!(outcome.status(), Some(status) if status < 400) {
		return;
	}

	#[cfg(feature = "tracing")]
	tracing::error!(
		attempt,
		elapsed_ms = elapsed.whole_milliseconds() as u64,
		detail = %describe(outcome),
		"Giving up on request."
	);

	#[cfg(not(feature = "tracing"))]
	let _ = (attempt, elapsed);
}

/// Logs a successful refresh with a redacted token preview.
pub fn token_refreshed(preview: &str) {
	#[cfg(feature = "tracing")]
	tracing::info!(token = preview, "Access token refreshed.");

	#[cfg(not(feature = "tracing"))]
	let _ = preview;
}

/// Logs a failed refresh.
pub fn token_refresh_failed(error: &AuthError) {
	#[cfg(feature = "tracing")]
	tracing::error!(error = %error, "Access token refresh failed.");

	#[cfg(not(feature = "tracing"))]
	let _ = error;
}

/// Logs a rate-limit header that could not be parsed.
pub fn malformed_header(name: &str, raw: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(header = name, value = raw, "Ignoring malformed rate-limit header.");

	#[cfg(not(feature = "tracing"))]
	let _ = (name, raw);
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
fn describe(outcome: &Outcome<'_>) -> String {
	match outcome {
		Outcome::Transport(error) => match error.source() {
			Some(source) => format!("{error} ({source})"),
			None => error.to_string(),
		},
		Outcome::Response(response) =>
			format!("HTTP {}: {}", response.status, response.body_preview(BODY_PREVIEW_CHARS)),
	}
}
