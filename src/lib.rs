//! Rate-limit aware, self-refreshing HTTP client for leaky-bucket REST APIs guarded by
//! short-lived OAuth bearer tokens.
//!
//! Every logical request runs through one pipeline: the [`rate_limit::RateLimiter`] predicts
//! how long the server's bucket needs to drain, the [`auth::TokenStore`] attaches the current
//! bearer token, and the [`retry::RetryPolicy`] decides whether an outcome is retried,
//! retried after a token refresh, or returned to the caller.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod rate_limit;
pub mod retry;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
