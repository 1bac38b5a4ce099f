//! Fluent construction of [`Config`] values in code.

// self
use crate::{
	_prelude::*,
	config::{self, Config, TokenFailurePolicy},
	error::ConfigError,
};

/// Builder for [`Config`] values assembled in code rather than loaded from JSON.
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
	values: Map<String, Value>,
	headers: Map<String, Value>,
}
impl ConfigBuilder {
	/// Sets the client identifier.
	pub fn client_id(self, value: impl Into<String>) -> Self {
		self.set(config::CLIENT_ID, value.into())
	}

	/// Sets the client secret.
	pub fn client_secret(self, value: impl Into<String>) -> Self {
		self.set(config::CLIENT_SECRET, value.into())
	}

	/// Sets the token endpoint URI.
	pub fn token_uri(self, value: impl Into<String>) -> Self {
		self.set(config::TOKEN_URI, value.into())
	}

	/// Sets the `App-Name` header value.
	pub fn app_name(self, value: impl Into<String>) -> Self {
		self.set(config::APP_NAME, value.into())
	}

	/// Sets the `App-Version` header value.
	pub fn app_version(self, value: impl Into<String>) -> Self {
		self.set(config::APP_VERSION, value.into())
	}

	/// Sets the `App-Platform` header value.
	pub fn app_platform(self, value: impl Into<String>) -> Self {
		self.set(config::APP_PLATFORM, value.into())
	}

	/// Sets the `OS-Platform-Version` header value.
	pub fn os_platform_version(self, value: impl Into<String>) -> Self {
		self.set(config::OS_PLATFORM_VERSION, value.into())
	}

	/// Sets the `User-Agent` header value.
	pub fn user_agent(self, value: impl Into<String>) -> Self {
		self.set(config::USER_AGENT, value.into())
	}

	/// Adds a default header sent with every call.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), Value::String(value.into()));

		self
	}

	/// Overrides the token store key.
	pub fn token_store_key(self, value: impl Into<String>) -> Self {
		self.set(config::TOKEN_STORE_KEY, value.into())
	}

	/// Overrides the payload field holding the bearer token.
	pub fn token_param_name(self, value: impl Into<String>) -> Self {
		self.set(config::TOKEN_PARAM_NAME, value.into())
	}

	/// Overrides the safety margin subtracted from `expire_in`; negative values clamp to zero.
	pub fn token_expiry_margin(self, margin: Duration) -> Self {
		self.set(config::TOKEN_EXPIRY_MARGIN_MS, Self::clamped_millis(margin))
	}

	/// Overrides the whole-request timeout.
	pub fn timeout(self, timeout: Duration) -> Self {
		self.set(config::TIMEOUT_MS, Self::clamped_millis(timeout))
	}

	/// Overrides the connect timeout.
	pub fn connect_timeout(self, timeout: Duration) -> Self {
		self.set(config::CONNECT_TIMEOUT_MS, Self::clamped_millis(timeout))
	}

	/// Selects the token failure policy.
	pub fn token_failure_policy(self, policy: TokenFailurePolicy) -> Self {
		self.set(config::TOKEN_FAILURE_POLICY, policy.as_str())
	}

	/// Sets an arbitrary key.
	pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.values.insert(key.to_owned(), value.into());

		self
	}

	/// Consumes the builder and produces a validated [`Config`].
	pub fn build(self) -> Result<Config, ConfigError> {
		let Self { mut values, headers } = self;

		if !headers.is_empty() {
			values.insert(config::HEADERS.into(), Value::Object(headers));
		}

		let config = Config::new(values);

		config.validate()?;

		Ok(config)
	}

	fn clamped_millis(duration: Duration) -> i64 {
		i64::try_from(duration.whole_milliseconds()).unwrap_or(i64::MAX).max(0)
	}
}
