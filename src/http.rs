//! Transport primitives for API and auth-endpoint calls.
//!
//! The module exposes [`HttpTransport`] alongside the [`ApiRequest`] and [`ApiResponse`]
//! value types so downstream crates can plug in their own HTTP stack. The transport owns
//! connection pooling, TLS, and redirects; the client only needs a status code, the
//! response headers, and the body back, or a [`TransportError`] when no response arrived.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::multipart::Form;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing a single request.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared (behind an
/// `Arc`) by every clone of a client. Transports never retry on their own; the request
/// pipeline decides what happens after each outcome.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with whatever response the server produced, including
	/// 4xx/5xx statuses. Only failures that prevented a response are errors.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP verbs supported by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `HEAD`
	Head,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Bucket units consumed by a read request.
	pub const READ_COST: u32 = 1;
	/// Bucket units consumed by a mutating request.
	pub const WRITE_COST: u32 = 10;

	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Head => "HEAD",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}

	/// Whether the verb mutates server-side state.
	pub const fn is_mutating(self) -> bool {
		matches!(self, Method::Post | Method::Put | Method::Patch | Method::Delete)
	}

	/// Leaky-bucket units the server charges for this verb.
	pub const fn cost(self) -> u32 {
		if self.is_mutating() { Self::WRITE_COST } else { Self::READ_COST }
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Payload attached to an outgoing request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// Pre-serialized bytes sent with the given `Content-Type`.
	Bytes {
		/// MIME type announced via `Content-Type`.
		content_type: String,
		/// Raw payload.
		data: Vec<u8>,
	},
	/// `multipart/form-data` text fields, in order.
	Multipart(Vec<(String, String)>),
}
impl RequestBody {
	/// Wraps an already serialized JSON document.
	pub fn json(data: impl Into<Vec<u8>>) -> Self {
		Self::Bytes { content_type: "application/json".into(), data: data.into() }
	}

	/// Whether no payload is attached.
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}
}

/// Fully resolved request handed to an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Header pairs in send order.
	pub headers: Vec<(String, String)>,
	/// Request payload.
	pub body: RequestBody,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: RequestBody::Empty }
	}

	/// Appends a header pair.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Replaces the request payload.
	pub fn with_body(mut self, body: RequestBody) -> Self {
		self.body = body;

		self
	}

	/// Returns the first header matching `name`, compared case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Response received from the server, whatever its status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lower-cased name; repeated headers are joined with `", "`.
	pub headers: BTreeMap<String, String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response with the given status and no headers or body.
	pub fn new(status: u16) -> Self {
		Self { status, ..Default::default() }
	}

	/// Adds (or appends to) a header; names are stored lower-cased.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.insert_header(name.as_ref(), value.into());

		self
	}

	/// Replaces the response body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Returns the header value for `name`, compared case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Renders the body for logs: pretty-printed when it is JSON, truncated to `max_chars`.
	pub fn body_preview(&self, max_chars: usize) -> String {
		let rendered = serde_json::from_slice::<serde_json::Value>(&self.body)
			.ok()
			.and_then(|value| serde_json::to_string_pretty(&value).ok())
			.unwrap_or_else(|| String::from_utf8_lossy(&self.body).into_owned());

		if rendered.chars().count() <= max_chars {
			return rendered;
		}

		let mut truncated = rendered.chars().take(max_chars).collect::<String>();

		truncated.push('…');

		truncated
	}

	pub(crate) fn insert_header(&mut self, name: &str, value: String) {
		self.headers
			.entry(name.to_ascii_lowercase())
			.and_modify(|existing| {
				existing.push_str(", ");
				existing.push_str(&value);
			})
			.or_insert(value);
	}
}

/// [`HttpTransport`] backed by a shared [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a transport whose client announces `user_agent`.
	pub fn with_user_agent(user_agent: &str) -> Result<Self, crate::error::ConfigError> {
		Ok(Self(ReqwestClient::builder().user_agent(user_agent).build()?))
	}

	fn build(&self, request: ApiRequest) -> reqwest::RequestBuilder {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Head => reqwest::Method::HEAD,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = self.0.request(method, request.url);

		for (name, value) in request.headers {
			builder = builder.header(name, value);
		}

		match request.body {
			RequestBody::Empty => builder,
			RequestBody::Bytes { content_type, data } =>
				builder.header(reqwest::header::CONTENT_TYPE, content_type).body(data),
			RequestBody::Multipart(fields) => {
				let form = fields
					.into_iter()
					.fold(Form::new(), |form, (name, value)| form.text(name, value));

				builder.multipart(form)
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		let builder = self.build(request);

		Box::pin(async move {
			let response = builder.send().await?;
			let mut api_response = ApiResponse::new(response.status().as_u16());

			for (name, value) in response.headers() {
				if let Ok(value) = value.to_str() {
					api_response.insert_header(name.as_str(), value.to_owned());
				}
			}

			api_response.body = response.bytes().await?.to_vec();

			Ok(api_response)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn costs_follow_the_verb() {
		assert_eq!(Method::Get.cost(), 1);
		assert_eq!(Method::Head.cost(), 1);

		for method in [Method::Post, Method::Put, Method::Patch, Method::Delete] {
			assert_eq!(method.cost(), 10, "{method} must be charged as a write.");
		}
	}

	#[test]
	fn response_headers_are_case_insensitive() {
		let response = ApiResponse::new(200)
			.with_header("X-LS-API-Bucket-Level", "3/60")
			.with_header("Set-Cookie", "a=1")
			.with_header("set-cookie", "b=2");

		assert_eq!(response.header("x-ls-api-bucket-level"), Some("3/60"));
		assert_eq!(response.header("SET-COOKIE"), Some("a=1, b=2"));
		assert_eq!(response.header("missing"), None);
	}

	#[test]
	fn body_preview_pretty_prints_and_truncates() {
		let response = ApiResponse::new(400).with_body(r#"{"message":"Bad request"}"#);

		assert_eq!(response.body_preview(256), "{\n  \"message\": \"Bad request\"\n}");
		assert_eq!(response.body_preview(5), "{\n  \"…");

		let plain = ApiResponse::new(502).with_body("upstream down");

		assert_eq!(plain.body_preview(8), "upstream…");
	}

	#[test]
	fn request_headers_lookup_ignores_case() {
		let request = ApiRequest::new(
			Method::Get,
			Url::parse("https://example.com/").expect("Fixture URL should parse."),
		)
		.with_header("Authorization", "Bearer x");

		assert_eq!(request.header("authorization"), Some("Bearer x"));
		assert!(request.body.is_empty());
	}
}
