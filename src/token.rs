//! Bearer token payloads issued by the token endpoint and their persistence contract.

pub mod handler;
pub mod secret;

pub use handler::*;
pub use secret::*;

// self
use crate::_prelude::*;

/// Payload field holding the session identifier.
pub const SESSION_ID: &str = "Session-Id";
/// Payload field holding the token UUID.
pub const TOKEN_UUID: &str = "token_uuid";
/// Payload field holding the grant type.
pub const GRANT_TYPE: &str = "grant_type";
/// Payload field naming the field that carries the bearer token.
pub const TOKEN_PARAM_NAME: &str = "token_param_name";
/// Payload field holding the token lifetime in milliseconds.
pub const EXPIRE_IN: &str = "expire_in";
/// Longest token lifetime accepted from the token endpoint.
pub const MAX_EXPIRE_IN: Duration = Duration::days(366);
/// Payload field holding the granted roles.
pub const ROLES: &str = "roles";
/// Payload field holding the user object.
pub const USER: &str = "user";

/// Immutable view over a token payload.
///
/// Every accessor is a projection of the raw map with a default fallback, and serializing a
/// token yields exactly the map it was built from.
#[derive(Clone, Default, PartialEq)]
pub struct Token {
	raw: Map<String, Value>,
}
impl Token {
	/// Wraps a raw payload as-is; no validation is performed.
	pub fn new(raw: Map<String, Value>) -> Self {
		Self { raw }
	}

	/// Wraps `value` when it is a JSON object.
	pub fn from_value(value: Value) -> Option<Self> {
		match value {
			Value::Object(raw) => Some(Self::new(raw)),
			_ => None,
		}
	}

	/// Session identifier, or `""`.
	pub fn session_id(&self) -> &str {
		self.str_field(SESSION_ID)
	}

	/// Token UUID, or `""`.
	pub fn token_uuid(&self) -> &str {
		self.str_field(TOKEN_UUID)
	}

	/// Grant type, or `""`.
	pub fn grant_type(&self) -> &str {
		self.str_field(GRANT_TYPE)
	}

	/// Name of the field carrying the bearer token, or `""`.
	pub fn token_param_name(&self) -> &str {
		self.str_field(TOKEN_PARAM_NAME)
	}

	/// Bearer token stored under [`token_param_name`](Self::token_param_name), or `""`.
	pub fn authorization_bearer_token(&self) -> &str {
		match self.token_param_name() {
			"" => "",
			name => self.str_field(name),
		}
	}

	/// Token lifetime in milliseconds, or `0`.
	pub fn expire_in(&self) -> i64 {
		self.raw.get(EXPIRE_IN).and_then(Value::as_i64).unwrap_or(0)
	}

	/// Granted roles; non-string entries are skipped.
	pub fn roles(&self) -> Vec<&str> {
		self.raw
			.get(ROLES)
			.and_then(Value::as_array)
			.map(|roles| roles.iter().filter_map(Value::as_str).collect())
			.unwrap_or_default()
	}

	/// Full user object, or an empty map.
	pub fn user(&self) -> Map<String, Value> {
		self.user_map().cloned().unwrap_or_default()
	}

	/// A single user field; `None` when the user object or the key is absent.
	pub fn user_field(&self, key: &str) -> Option<&Value> {
		self.user_map()?.get(key)
	}

	/// String value of `field`, or `""` when absent or not a string.
	pub fn str_field(&self, field: &str) -> &str {
		self.raw.get(field).and_then(Value::as_str).unwrap_or("")
	}

	/// Returns `true` when the payload carries no fields.
	pub fn is_empty(&self) -> bool {
		self.raw.is_empty()
	}

	/// Returns the raw payload.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.raw
	}

	/// Consumes the token and returns the raw payload.
	pub fn into_map(self) -> Map<String, Value> {
		self.raw
	}

	fn user_map(&self) -> Option<&Map<String, Value>> {
		self.raw.get(USER).and_then(Value::as_object)
	}
}
impl From<Map<String, Value>> for Token {
	fn from(raw: Map<String, Value>) -> Self {
		Self::new(raw)
	}
}
impl Serialize for Token {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		self.raw.serialize(serializer)
	}
}
impl<'de> Deserialize<'de> for Token {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Map::deserialize(deserializer).map(Self::new)
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("session_id", &self.session_id())
			.field("token_uuid", &self.token_uuid())
			.field("grant_type", &self.grant_type())
			.field("token_param_name", &self.token_param_name())
			.field("authorization_bearer_token", &"<redacted>")
			.field("expire_in", &self.expire_in())
			.field("roles", &self.roles())
			.finish()
	}
}
