//! Client configuration: endpoints, retry policy, and throttling bounds.
//!
//! Values are assembled through [`ClientConfigBuilder`], which validates that every endpoint
//! speaks HTTPS before a client is ever built. [`ClientConfig`] is serde-friendly so host
//! applications can embed it in their own configuration files.

// self
use crate::{_prelude::*, auth::AccountId, error::ConfigError, retry::RetryPolicy};

/// Default API host.
pub const DEFAULT_API_HOST: &str = "api.lightspeedapp.com";
/// Default OAuth token endpoint used for refresh grants.
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://cloud.lightspeedapp.com/oauth/access_token.php";

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Scheme + authority the account base URL is built on (e.g. `https://api.example.com`).
	pub api_origin: Url,
	/// Token endpoint receiving `refresh_token` grants.
	pub auth_endpoint: Url,
	/// Retry ceilings and backoff.
	pub retry: RetryPolicy,
	/// Upper bound on any single rate-limit wait.
	pub max_wait: Duration,
	/// `User-Agent` announced by the default transport.
	pub user_agent: String,
}
impl ClientConfig {
	/// Creates a builder seeded with the production defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Base URL every account-relative request is resolved against:
	/// `<origin>/API/Account/<account_id>/`.
	pub fn account_base(&self, account: &AccountId) -> Result<Url, ConfigError> {
		self.api_origin
			.join(&format!("/API/Account/{account}/"))
			.map_err(|source| ConfigError::InvalidUrl { endpoint: "api", source })
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_origin: Url::parse(&format!("https://{DEFAULT_API_HOST}/"))
				.expect("Default API origin must parse."),
			auth_endpoint: Url::parse(DEFAULT_AUTH_ENDPOINT)
				.expect("Default auth endpoint must parse."),
			retry: RetryPolicy::default(),
			max_wait: crate::rate_limit::RateLimiter::DEFAULT_MAX_WAIT,
			user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
		}
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
	api_origin: Option<String>,
	auth_endpoint: Option<String>,
	retry: Option<RetryPolicy>,
	max_wait: Option<Duration>,
	user_agent: Option<String>,
}
impl ClientConfigBuilder {
	/// Overrides the API host (`api.example.com`) or full origin (`https://api.example.com:8443`).
	pub fn api_host(mut self, host: impl Into<String>) -> Self {
		self.api_origin = Some(host.into());

		self
	}

	/// Overrides the token endpoint.
	pub fn auth_endpoint(mut self, url: impl Into<String>) -> Self {
		self.auth_endpoint = Some(url.into());

		self
	}

	/// Overrides the retry policy.
	pub fn retry(mut self, policy: RetryPolicy) -> Self {
		self.retry = Some(policy);

		self
	}

	/// Overrides the cap applied to rate-limit waits.
	pub fn max_wait(mut self, max_wait: Duration) -> Self {
		self.max_wait = Some(if max_wait.is_negative() { Duration::ZERO } else { max_wait });

		self
	}

	/// Overrides the `User-Agent` string.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut config = ClientConfig::default();

		if let Some(host) = self.api_origin {
			let raw = if host.contains("://") { host } else { format!("https://{host}") };

			config.api_origin = Url::parse(&raw)
				.map_err(|source| ConfigError::InvalidUrl { endpoint: "api", source })?;
		}
		if let Some(endpoint) = self.auth_endpoint {
			config.auth_endpoint = Url::parse(&endpoint)
				.map_err(|source| ConfigError::InvalidUrl { endpoint: "auth", source })?;
		}
		if let Some(retry) = self.retry {
			config.retry = retry;
		}
		if let Some(max_wait) = self.max_wait {
			config.max_wait = max_wait;
		}
		if let Some(user_agent) = self.user_agent {
			config.user_agent = user_agent;
		}

		validate_endpoint("api", &config.api_origin)?;
		validate_endpoint("auth", &config.auth_endpoint)?;

		Ok(config)
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
