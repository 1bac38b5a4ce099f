//! Bearer token value that never shows up in logs.

// self
use crate::_prelude::*;

const MASK: &str = "<redacted>";

/// Bearer token attached to outbound calls.
///
/// `Debug` reports only the length and `Display` only the mask, so spans and error messages that
/// capture a [`TokenSecret`] cannot leak the credential.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a raw bearer value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw bearer value; only for writing headers or stores.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when no bearer value is held.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// `Authorization` header value, flagged sensitive; `None` when the bearer holds bytes a
	/// header cannot carry.
	pub fn bearer_header(&self) -> Option<HeaderValue> {
		let mut value = HeaderValue::try_from(format!("Bearer {}", self.0)).ok()?;

		value.set_sensitive(true);

		Some(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSecret").field("len", &self.0.len()).finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(MASK)
	}
}
