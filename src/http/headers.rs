//! Header names and helpers on top of [`HeaderMap`].

// self
use crate::{_prelude::*, error::ConfigError};

/// Header names sent by the client.
pub mod names {
	pub use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};

	// crates.io
	use http::HeaderName;

	/// `App-Name`.
	pub const APP_NAME: HeaderName = HeaderName::from_static("app-name");
	/// `App-Platform`.
	pub const APP_PLATFORM: HeaderName = HeaderName::from_static("app-platform");
	/// `App-Version`.
	pub const APP_VERSION: HeaderName = HeaderName::from_static("app-version");
	/// `OS-Platform-Version`.
	pub const OS_PLATFORM_VERSION: HeaderName = HeaderName::from_static("os-platform-version");
}

/// Validates a textual header pair.
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
	let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
	let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
	let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

	Ok((header_name, header_value))
}

/// Inserts `value` unless `name` already carries at least one value.
pub fn insert_if_absent(headers: &mut HeaderMap, name: &HeaderName, value: &HeaderValue) -> bool {
	if headers.contains_key(name) {
		return false;
	}

	headers.insert(name.clone(), value.clone());

	true
}

/// First value of `name` as text; `None` when absent or not visible ASCII.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|value| value.to_str().ok())
}

/// Returns `true` for keys that look like positional array indices (`"0"`, `"12"`).
pub fn is_positional_key(key: &str) -> bool {
	!key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}
