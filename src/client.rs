//! Request pipeline and the verb-named public surface.
//!
//! Every call on [`ApiClient`] runs one logical request through the same loop:
//!
//! 1. ask the [`RateLimiter`] how long the bucket needs to drain for this verb's cost and sleep
//!    that long (no lock is held while sleeping);
//! 2. attach `Authorization: Bearer <token>` and `Accept: application/json`;
//! 3. send through the [`HttpTransport`] and let the [`RateLimiter`] observe the result;
//! 4. let the [`RetryPolicy`] decide between resending, refreshing the token first, or
//!    returning.
//!
//! Attempts within one logical request are strictly sequential. Responses are returned
//! whatever their status once the policy gives up; only transport exhaustion and refresh
//! failures become [`Error`]s.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenStore},
	config::ClientConfig,
	error::ConfigError,
	http::{ApiRequest, ApiResponse, HttpTransport, Method, RequestBody},
	obs::{self, RequestOutcome, RequestSpan},
	rate_limit::RateLimiter,
	retry::{Outcome, RetryDecision, RetryPolicy, RetryState},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const PIPELINE_HEADERS: [&str; 2] = ["authorization", "accept"];

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Rate-limited, self-refreshing client scoped to one account.
///
/// Clones share the transport, the token store, and the rate limiter, so every clone draws
/// from the same bucket prediction and benefits from the same refreshed token.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for API calls and token refreshes.
	pub transport: Arc<T>,
	/// Bearer-token holder.
	pub tokens: Arc<TokenStore>,
	/// Leaky-bucket predictor.
	pub rate_limiter: Arc<RateLimiter>,
	/// Retry classification and backoff.
	pub retry: RetryPolicy,
	base_url: Url,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that sends through the caller-provided transport.
	pub fn with_transport(
		credentials: Credentials,
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
	) -> Result<Self, ConfigError> {
		let base_url = config.account_base(&credentials.account_id)?;

		Ok(Self {
			transport: transport.into(),
			tokens: Arc::new(TokenStore::new(credentials, config.auth_endpoint)),
			rate_limiter: Arc::new(RateLimiter::new(config.max_wait)),
			retry: config.retry,
			base_url,
		})
	}

	/// Replaces the token store, e.g. to seed a token obtained in a previous run.
	pub fn with_token_store(mut self, tokens: TokenStore) -> Self {
		self.tokens = Arc::new(tokens);

		self
	}

	/// Account base URL every path is resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Resolves an account-relative path (e.g. `Item.json?limit=50`) into an absolute URL.
	///
	/// Paths that would leave the account base (absolute URLs, leading `/`, `..`) are
	/// rejected.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		let invalid = || ConfigError::InvalidPath { path: path.to_owned() };
		let url = self.base_url.join(path).map_err(|_| invalid())?;

		if url.as_str().starts_with(self.base_url.as_str()) && url.path() != self.base_url.path() {
			Ok(url)
		} else {
			Err(invalid())
		}
	}

	/// Sends a `GET`.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.execute(Method::Get, path, RequestBody::Empty, &[]).await
	}

	/// Sends a `HEAD`.
	pub async fn head(&self, path: &str) -> Result<ApiResponse> {
		self.execute(Method::Head, path, RequestBody::Empty, &[]).await
	}

	/// Sends a `POST` with `body`.
	pub async fn post(&self, path: &str, body: RequestBody) -> Result<ApiResponse> {
		self.execute(Method::Post, path, body, &[]).await
	}

	/// Sends a `PUT` with `body`.
	pub async fn put(&self, path: &str, body: RequestBody) -> Result<ApiResponse> {
		self.execute(Method::Put, path, body, &[]).await
	}

	/// Sends a `PATCH` with `body`.
	pub async fn patch(&self, path: &str, body: RequestBody) -> Result<ApiResponse> {
		self.execute(Method::Patch, path, body, &[]).await
	}

	/// Sends a `DELETE`.
	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.execute(Method::Delete, path, RequestBody::Empty, &[]).await
	}

	/// Runs one logical request through the throttle/authenticate/send/retry pipeline.
	///
	/// `headers` are appended to every attempt; `Authorization` and `Accept` headers among
	/// them are ignored because the pipeline sets both.
	pub async fn execute(
		&self,
		method: Method,
		path: &str,
		body: RequestBody,
		headers: &[(String, String)],
	) -> Result<ApiResponse> {
		let url = self.resolve(path)?;
		let span = RequestSpan::new(method, path);
		let result = span.instrument(self.run(method, url, body, headers)).await;

		match &result {
			Ok(_) => obs::record_request_outcome(method, RequestOutcome::Success),
			Err(_) => obs::record_request_outcome(method, RequestOutcome::Failure),
		}

		result
	}

	async fn run(
		&self,
		method: Method,
		url: Url,
		body: RequestBody,
		headers: &[(String, String)],
	) -> Result<ApiResponse> {
		let cost = method.cost();
		let mut state = RetryState::new();

		loop {
			let wait = self.rate_limiter.wait_duration(cost);

			if wait.is_positive() {
				obs::throttled(cost, wait);
				sleep(wait).await;
			}

			let request = self.authorize(ApiRequest::new(method, url.clone()), headers);

			obs::sending(state.attempt);
			obs::record_request_outcome(method, RequestOutcome::Attempt);

			let sent = self.transport.send(request.with_body(body.clone())).await;

			match &sent {
				Ok(response) => self.rate_limiter.observe(response),
				Err(_) => self.rate_limiter.touch(),
			}

			let outcome = match &sent {
				Ok(response) => Outcome::Response(response),
				Err(err) => Outcome::Transport(err),
			};

			match self.retry.decide(state.attempt, outcome) {
				RetryDecision::RetryImmediately(delay) => {
					obs::retrying(state.attempt, &outcome, delay);
					obs::record_request_outcome(method, RequestOutcome::Retry);

					if delay.is_positive() {
						sleep(delay).await;
					}
				},
				RetryDecision::RetryAfterRefresh => {
					obs::refreshing(state.attempt);
					obs::record_request_outcome(method, RequestOutcome::Refresh);
					self.tokens.refresh(&*self.transport).await?;
				},
				RetryDecision::GiveUp => {
					obs::giving_up(state.attempt, state.elapsed(), &outcome);

					return sent.map_err(|source| Error::RetriesExhausted {
						attempts: state.attempt + 1,
						source,
					});
				},
			}

			state.advance();
		}
	}

	fn authorize(&self, mut request: ApiRequest, headers: &[(String, String)]) -> ApiRequest {
		let token = self.tokens.current_token();

		request = request
			.with_header("Authorization", format!("Bearer {}", token.expose()))
			.with_header("Accept", "application/json");

		for (name, value) in headers {
			if !PIPELINE_HEADERS.iter().any(|owned| name.eq_ignore_ascii_case(owned)) {
				request = request.with_header(name.clone(), value.clone());
			}
		}

		request
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client for the production endpoints using the default reqwest transport.
	pub fn new(credentials: Credentials) -> Result<Self> {
		Self::with_config(credentials, ClientConfig::default())
	}

	/// Creates a client for `config` using a reqwest transport announcing
	/// [`ClientConfig::user_agent`].
	pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
		let transport = ReqwestTransport::with_user_agent(&config.user_agent)?;

		Ok(Self::with_transport(credentials, config, transport)?)
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			tokens: Arc::clone(&self.tokens),
			rate_limiter: Arc::clone(&self.rate_limiter),
			retry: self.retry,
			base_url: self.base_url.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.base_url.as_str())
			.field("client_id", &self.tokens.credentials().client_id)
			.field("retry", &self.retry)
			.finish()
	}
}

async fn sleep(duration: Duration) {
	tokio::time::sleep(std::time::Duration::try_from(duration).unwrap_or_default()).await;
}
