//! Immutable client credentials supplied once at construction.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, Secret},
};

/// OAuth client credentials plus the account every request is scoped to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: Secret,
	/// Long-lived refresh token exchanged for short-lived access tokens.
	pub refresh_token: Secret,
	/// Remote account identifier.
	pub account_id: AccountId,
}
impl Credentials {
	/// Bundles the four credential fields.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		refresh_token: impl Into<String>,
		account_id: AccountId,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: Secret::new(client_secret),
			refresh_token: Secret::new(refresh_token),
			account_id,
		}
	}

	/// Form fields sent to the auth endpoint for a `refresh_token` grant.
	pub(crate) fn refresh_form(&self) -> Vec<(String, String)> {
		vec![
			("client_id".into(), self.client_id.clone()),
			("client_secret".into(), self.client_secret.expose().to_owned()),
			("refresh_token".into(), self.refresh_token.expose().to_owned()),
			("grant_type".into(), "refresh_token".into()),
		]
	}
}
