//! Secure secret wrapper that redacts sensitive material.

// self
use crate::_prelude::*;

const PREVIEW_CHARS: usize = 8;

/// Redacted secret wrapper keeping tokens and client secrets out of logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether the secret holds no characters (e.g. no token was issued yet).
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns the first eight characters followed by an ellipsis, suitable for logs.
	pub fn preview(&self) -> String {
		let mut preview = self.0.chars().take(PREVIEW_CHARS).collect::<String>();

		if self.0.chars().count() > PREVIEW_CHARS {
			preview.push('…');
		}

		preview
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
