//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{collections::VecDeque, sync::Arc};
// crates.io
use parking_lot::Mutex;
use tokio::time::Instant;
// self
use ls_api_client::{
	auth::{AccountId, Credentials},
	client::ApiClient,
	config::ClientConfig,
	error::TransportError,
	http::{ApiRequest, ApiResponse, HttpTransport, TransportFuture},
	url::Url,
};

pub const AUTH_ENDPOINT: &str = "https://auth.example.com/oauth/access_token.php";
pub const API_HOST: &str = "api.example.com";

/// Credentials fixture shared across integration tests.
pub fn test_credentials() -> Credentials {
	Credentials::new(
		"client-test",
		"secret-test",
		"refresh-test",
		AccountId::new("12345").expect("Test account identifier should be valid."),
	)
}

/// Configuration pointing at the fake hosts served by [`ScriptedTransport`].
pub fn test_config() -> ClientConfig {
	ClientConfig::builder()
		.api_host(API_HOST)
		.auth_endpoint(AUTH_ENDPOINT)
		.build()
		.expect("Test configuration should build.")
}

/// One scripted reply for the API host.
pub enum Step {
	Respond(ApiResponse),
	Fail,
}
impl Step {
	pub fn status(status: u16) -> Self {
		Self::Respond(ApiResponse::new(status))
	}

	fn materialize(&self) -> Result<ApiResponse, TransportError> {
		match self {
			Self::Respond(response) => Ok(response.clone()),
			Self::Fail => Err(TransportError::Io(std::io::Error::other("connection reset"))),
		}
	}
}

/// Request observed by [`ScriptedTransport`], stamped with the (possibly paused) tokio clock.
pub struct Sent {
	pub at: Instant,
	pub request: ApiRequest,
}

/// Fake transport that plays a script for API calls and mints numbered tokens for refreshes.
///
/// The last API step repeats once the script runs out.
pub struct ScriptedTransport {
	auth_url: Url,
	api_script: Mutex<VecDeque<Step>>,
	last_step: Mutex<Option<Step>>,
	auth_replies: Mutex<VecDeque<ApiResponse>>,
	api_sent: Mutex<Vec<Sent>>,
	auth_sent: Mutex<Vec<Sent>>,
}
impl ScriptedTransport {
	pub fn new(script: impl IntoIterator<Item = Step>) -> Arc<Self> {
		Arc::new(Self {
			auth_url: Url::parse(AUTH_ENDPOINT).expect("Auth endpoint fixture should parse."),
			api_script: Mutex::new(script.into_iter().collect()),
			last_step: Mutex::new(None),
			auth_replies: Mutex::new(VecDeque::new()),
			api_sent: Mutex::new(Vec::new()),
			auth_sent: Mutex::new(Vec::new()),
		})
	}

	/// Queues explicit auth endpoint replies ahead of the default numbered tokens.
	pub fn with_auth_replies(
		self: Arc<Self>,
		replies: impl IntoIterator<Item = ApiResponse>,
	) -> Arc<Self> {
		self.auth_replies.lock().extend(replies);

		self
	}

	pub fn api_calls(&self) -> usize {
		self.api_sent.lock().len()
	}

	pub fn auth_calls(&self) -> usize {
		self.auth_sent.lock().len()
	}

	pub fn api_send_times(&self) -> Vec<Instant> {
		self.api_sent.lock().iter().map(|sent| sent.at).collect()
	}

	pub fn authorization_headers(&self) -> Vec<String> {
		self.api_sent
			.lock()
			.iter()
			.map(|sent| sent.request.header("authorization").unwrap_or_default().to_owned())
			.collect()
	}

	pub fn api_requests(&self) -> Vec<ApiRequest> {
		self.api_sent.lock().iter().map(|sent| sent.request.clone()).collect()
	}

	fn next_api_reply(&self) -> Result<ApiResponse, TransportError> {
		let mut last = self.last_step.lock();

		if let Some(step) = self.api_script.lock().pop_front() {
			*last = Some(step);
		}

		match last.as_ref() {
			Some(step) => step.materialize(),
			None => Ok(ApiResponse::new(200)),
		}
	}

	fn next_auth_reply(&self) -> ApiResponse {
		let issued = self.auth_sent.lock().len() + 1;

		self.auth_replies.lock().pop_front().unwrap_or_else(|| {
			ApiResponse::new(200).with_body(format!("{{\"access_token\":\"token-{issued}\"}}"))
		})
	}
}
impl HttpTransport for ScriptedTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		let is_auth = request.url == self.auth_url;
		let reply = if is_auth {
			let reply = self.next_auth_reply();

			self.auth_sent.lock().push(Sent { at: Instant::now(), request });

			Ok(reply)
		} else {
			let reply = self.next_api_reply();

			self.api_sent.lock().push(Sent { at: Instant::now(), request });

			reply
		};

		Box::pin(async move { reply })
	}
}

/// Builds a client wired to `transport` with the test configuration.
pub fn scripted_client(transport: &Arc<ScriptedTransport>) -> ApiClient<ScriptedTransport> {
	ApiClient::with_transport(test_credentials(), test_config(), Arc::clone(transport))
		.expect("Scripted client should build.")
}
