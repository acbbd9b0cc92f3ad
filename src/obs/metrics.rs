// self
use crate::{http::Method, obs::RequestOutcome};

/// Records a pipeline outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(method: Method, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"ls_api_request_total",
			"method" => method.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (method, outcome);
	}
}

/// Records the result of one refresh-token exchange.
///
/// Only [`RequestOutcome::Success`] and [`RequestOutcome::Failure`] are meaningful here.
pub fn record_token_refresh(outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!("ls_api_token_refresh_total", "outcome" => outcome.as_str()).increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = outcome;
}
