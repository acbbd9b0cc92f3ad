//! Validated account identifier used to build the API base URL.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Account identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Account identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier contains a character that would alter the URL path.
	#[error("Account identifier contains the reserved character `{0}`.")]
	ReservedCharacter(char),
	/// The identifier exceeded the allowed character count.
	#[error("Account identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Identifier of the remote account every request is scoped to.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);
impl AccountId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for AccountId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for AccountId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<AccountId> for String {
	fn from(value: AccountId) -> Self {
		value.0
	}
}
impl TryFrom<String> for AccountId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for AccountId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Account({})", self.0)
	}
}
impl Display for AccountId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for AccountId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if let Some(reserved) = view.chars().find(|c| matches!(c, '/' | '?' | '#' | '\\' | '%')) {
		return Err(IdentifierError::ReservedCharacter(reserved));
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
