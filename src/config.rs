//! Key/value configuration consumed by [`Client`](crate::client::Client).
//!
//! A [`Config`] is a JSON object read once and never mutated afterwards. Lookups go through
//! [`Config::get`] / [`Config::has`] like a plain mapping, while typed helpers resolve the keys
//! the client understands and apply their defaults.

pub mod builder;

pub use builder::*;

// std
use std::{fs, path::Path};
// self
use crate::{_prelude::*, error::ConfigError};

/// Key holding the client identifier sent to the token endpoint.
pub const CLIENT_ID: &str = "client_id";
/// Key holding the client secret sent to the token endpoint.
pub const CLIENT_SECRET: &str = "client_secret";
/// Key holding the absolute token endpoint URI.
pub const TOKEN_URI: &str = "token_uri";
/// Key holding the `App-Name` header value.
pub const APP_NAME: &str = "app_name";
/// Key holding the `App-Version` header value.
pub const APP_VERSION: &str = "app_version";
/// Key holding the `App-Platform` header value.
pub const APP_PLATFORM: &str = "app_platform";
/// Key holding the `OS-Platform-Version` header value.
pub const OS_PLATFORM_VERSION: &str = "os_platform_version";
/// Key holding the `User-Agent` header value.
pub const USER_AGENT: &str = "user_agent";
/// Key holding an object of extra default headers.
pub const HEADERS: &str = "headers";
/// Key naming the token store entry that caches the bearer token.
pub const TOKEN_STORE_KEY: &str = "token_store_key";
/// Key naming the payload field that holds the bearer token.
pub const TOKEN_PARAM_NAME: &str = "token_param_name";
/// Key holding the safety margin (milliseconds) subtracted from `expire_in`.
pub const TOKEN_EXPIRY_MARGIN_MS: &str = "token_expiry_margin_ms";
/// Key holding the whole-request timeout in milliseconds.
pub const TIMEOUT_MS: &str = "timeout_ms";
/// Key holding the connect timeout in milliseconds.
pub const CONNECT_TIMEOUT_MS: &str = "connect_timeout_ms";
/// Key selecting [`TokenFailurePolicy`].
pub const TOKEN_FAILURE_POLICY: &str = "token_failure_policy";

const REQUIRED_KEYS: [&str; 3] = [CLIENT_ID, CLIENT_SECRET, TOKEN_URI];

/// What the client does when a bearer token cannot be obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenFailurePolicy {
	#[default]
	/// Proceed without an `Authorization` header and emit a warning.
	Degrade,
	/// Abort the call with [`Error::TokenAcquisition`].
	Fail,
}
impl TokenFailurePolicy {
	/// Returns the configuration label for the policy.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Degrade => "degrade",
			Self::Fail => "fail",
		}
	}
}
impl FromStr for TokenFailurePolicy {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"degrade" => Ok(Self::Degrade),
			"fail" => Ok(Self::Fail),
			other => Err(ConfigError::InvalidValue {
				key: TOKEN_FAILURE_POLICY,
				reason: format!("unknown policy `{other}`"),
			}),
		}
	}
}

/// Read-only key/value configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(Map<String, Value>);
impl Config {
	/// Default token store key.
	pub const DEFAULT_TOKEN_STORE_KEY: &str = "microservices_client_token";
	/// Default payload field holding the bearer token.
	pub const DEFAULT_TOKEN_PARAM_NAME: &str = "AuthorizationBearerToken";
	/// Default safety margin subtracted from a token's lifetime.
	pub const DEFAULT_TOKEN_EXPIRY_MARGIN: Duration = Duration::seconds(60);
	/// Default whole-request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);
	/// Default connect timeout.
	pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::seconds(10);

	/// Wraps an existing key/value map.
	pub fn new(values: Map<String, Value>) -> Self {
		Self(values)
	}

	/// Returns a builder for assembling configurations in code.
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder::default()
	}

	/// Parses a JSON object.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		serde_json::from_str(raw).map(Self).map_err(|source| ConfigError::Parse { source })
	}

	/// Loads a JSON object from disk.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;

		Self::from_json_str(&raw)
	}

	/// Returns the raw value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Returns the string stored under `key`, or `default` when absent or not a string.
	pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
		self.get(key).and_then(Value::as_str).unwrap_or(default)
	}

	/// Returns `true` when `key` holds a non-null value that is not an empty string.
	pub fn has(&self, key: &str) -> bool {
		match self.get(key) {
			None | Some(Value::Null) => false,
			Some(Value::String(s)) => !s.trim().is_empty(),
			Some(_) => true,
		}
	}

	/// Returns `true` when [`validate`](Self::validate) passes.
	pub fn is_valid(&self) -> bool {
		self.validate().is_ok()
	}

	/// Checks the required keys and the token endpoint URI.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if let Some(key) = REQUIRED_KEYS.into_iter().find(|key| !self.has(key)) {
			return Err(ConfigError::MissingKey { key });
		}

		self.token_uri()?;
		self.token_failure_policy()?;

		Ok(())
	}

	/// Client identifier (empty when absent).
	pub fn client_id(&self) -> &str {
		self.get_str_or(CLIENT_ID, "")
	}

	/// Client secret (empty when absent).
	pub fn client_secret(&self) -> &str {
		self.get_str_or(CLIENT_SECRET, "")
	}

	/// Parsed token endpoint URI.
	pub fn token_uri(&self) -> Result<Url, ConfigError> {
		let raw = self.get_str_or(TOKEN_URI, "");

		Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { url: raw.to_owned(), source })
	}

	/// Store key under which the bearer token is cached.
	pub fn token_store_key(&self) -> &str {
		self.get_str_or(TOKEN_STORE_KEY, Self::DEFAULT_TOKEN_STORE_KEY)
	}

	/// Payload field holding the bearer token when the payload does not name one itself.
	pub fn token_param_name(&self) -> &str {
		self.get_str_or(TOKEN_PARAM_NAME, Self::DEFAULT_TOKEN_PARAM_NAME)
	}

	/// Safety margin subtracted from `expire_in` before caching.
	pub fn token_expiry_margin(&self) -> Duration {
		self.millis_or(TOKEN_EXPIRY_MARGIN_MS, Self::DEFAULT_TOKEN_EXPIRY_MARGIN)
	}

	/// Whole-request timeout applied by the default transport.
	pub fn timeout(&self) -> Duration {
		self.millis_or(TIMEOUT_MS, Self::DEFAULT_TIMEOUT)
	}

	/// Connect timeout applied by the default transport.
	pub fn connect_timeout(&self) -> Duration {
		self.millis_or(CONNECT_TIMEOUT_MS, Self::DEFAULT_CONNECT_TIMEOUT)
	}

	/// Policy applied when a token cannot be acquired.
	pub fn token_failure_policy(&self) -> Result<TokenFailurePolicy, ConfigError> {
		match self.get(TOKEN_FAILURE_POLICY) {
			None | Some(Value::Null) => Ok(TokenFailurePolicy::default()),
			Some(Value::String(raw)) => raw.parse(),
			Some(other) => Err(ConfigError::InvalidValue {
				key: TOKEN_FAILURE_POLICY,
				reason: format!("expected a string, found {other}"),
			}),
		}
	}

	/// Extra default headers declared under `headers`, skipping non-string values.
	pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
		self.get(HEADERS)
			.and_then(Value::as_object)
			.into_iter()
			.flat_map(|map| map.iter())
			.filter_map(|(key, value)| value.as_str().map(|value| (key.as_str(), value)))
	}

	/// Returns the underlying map.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	fn millis_or(&self, key: &str, default: Duration) -> Duration {
		self.get(key)
			.and_then(Value::as_i64)
			.filter(|ms| *ms >= 0)
			.map(Duration::milliseconds)
			.unwrap_or(default)
	}
}
impl From<Map<String, Value>> for Config {
	fn from(values: Map<String, Value>) -> Self {
		Self::new(values)
	}
}
