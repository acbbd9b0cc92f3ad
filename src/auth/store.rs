//! Bearer-token holder with refresh-token rotation against the auth endpoint.
//!
//! The current access token sits behind a [`RwLock`] and is swapped in a single write once
//! the auth endpoint answered with a usable token, so readers observe either the previous or
//! the new value. Refreshes themselves are single-flight: concurrent callers queue on an async
//! guard, and a caller that finds the token already replaced once it gets the guard returns
//! without contacting the auth endpoint. The lock on the token value is never held across an
//! `.await`.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, Secret},
	error::AuthError,
	http::{ApiRequest, HttpTransport, Method, RequestBody},
	obs::{self, RequestOutcome},
};

const REJECTED_BODY_PREVIEW_CHARS: usize = 256;

#[derive(Deserialize)]
struct RefreshResponse {
	#[serde(default)]
	access_token: Option<String>,
}

/// Holds the current access token and the credentials needed to mint a new one.
#[derive(Debug)]
pub struct TokenStore {
	credentials: Credentials,
	auth_endpoint: Url,
	token: RwLock<Secret>,
	refresh_guard: AsyncMutex<()>,
}
impl TokenStore {
	/// Creates a store with no access token; the first request is expected to hit a 401.
	pub fn new(credentials: Credentials, auth_endpoint: Url) -> Self {
		Self {
			credentials,
			auth_endpoint,
			token: RwLock::new(Secret::default()),
			refresh_guard: AsyncMutex::new(()),
		}
	}

	/// Seeds the store with an access token obtained elsewhere.
	pub fn with_token(self, token: impl Into<String>) -> Self {
		*self.token.write() = Secret::new(token);

		self
	}

	/// Credentials this store refreshes with.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Returns the last known access token (empty before the first refresh).
	pub fn current_token(&self) -> Secret {
		self.token.read().clone()
	}

	/// Exchanges the refresh token for a new access token.
	///
	/// On failure the previous token is left in place. If another caller replaced the token
	/// while this one waited for the guard, the new token is kept and no request is sent.
	pub async fn refresh<T>(&self, transport: &T) -> Result<(), AuthError>
	where
		T: ?Sized + HttpTransport,
	{
		let seen = self.current_token();
		let _singleflight = self.refresh_guard.lock().await;

		if *self.token.read() != seen {
			return Ok(());
		}

		match self.request_token(transport).await {
			Ok(token) => {
				obs::token_refreshed(&token.preview());

				*self.token.write() = token;

				obs::record_token_refresh(RequestOutcome::Success);

				Ok(())
			},
			Err(err) => {
				obs::token_refresh_failed(&err);
				obs::record_token_refresh(RequestOutcome::Failure);

				Err(err)
			},
		}
	}

	async fn request_token<T>(&self, transport: &T) -> Result<Secret, AuthError>
	where
		T: ?Sized + HttpTransport,
	{
		let request = ApiRequest::new(Method::Post, self.auth_endpoint.clone())
			.with_header("Accept", "application/json")
			.with_body(RequestBody::Multipart(self.credentials.refresh_form()));
		let response = transport.send(request).await?;

		if !response.is_success() {
			return Err(AuthError::Rejected {
				status: response.status,
				body: response.body_preview(REJECTED_BODY_PREVIEW_CHARS),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let parsed: RefreshResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| AuthError::MalformedResponse { source })?;

		match parsed.access_token {
			Some(token) if !token.is_empty() => Ok(Secret::new(token)),
			_ => Err(AuthError::MissingAccessToken),
		}
	}
}
