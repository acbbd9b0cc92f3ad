//! Client-level error types shared by the token store, transports, and the request pipeline.
//!
//! HTTP error statuses are not represented here: once the retry policy gives up on a
//! response, the [`ApiResponse`](crate::http::ApiResponse) is handed back verbatim so callers
//! can inspect the API's own error payload.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token refresh failed; the retry loop was abandoned.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Every attempt failed at the transport level before a response arrived.
	#[error("Transport failed after {attempts} attempts.")]
	RetriesExhausted {
		/// Number of requests put on the wire, including the initial one.
		attempts: u32,
		/// Failure reported by the final attempt.
		#[source]
		source: TransportError,
	},
}

/// Failures raised while exchanging the refresh token for a new access token.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// The auth endpoint could not be reached.
	#[error("Auth endpoint is unreachable.")]
	Transport(#[from] TransportError),
	/// The auth endpoint answered with a non-success status.
	#[error("Auth endpoint rejected the refresh with HTTP {status}: {body}.")]
	Rejected {
		/// HTTP status code returned by the auth endpoint.
		status: u16,
		/// Truncated response body for diagnostics.
		body: String,
	},
	/// The auth endpoint returned a body that is not the expected JSON object.
	#[error("Auth endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The JSON response lacked a usable `access_token` field.
	#[error("Auth endpoint response is missing access_token.")]
	MissingAccessToken,
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A configured URL or host cannot be parsed.
	#[error("The {endpoint} URL is invalid.")]
	InvalidUrl {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path escapes the account base URL or cannot be joined onto it.
	#[error("Request path `{path}` cannot be resolved against the account base URL.")]
	InvalidPath {
		/// Offending request path.
		path: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO). Always eligible for retry.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
