//! Client-level error types shared across configuration, transport, stores, and token grants.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Bearer token could not be acquired and the client is configured to fail.
	#[error(transparent)]
	TokenAcquisition(#[from] TokenError),

	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	Body {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Configuration source could not be read.
	#[error("Configuration file {path} could not be read.")]
	Read {
		/// Path that failed to load.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Configuration source is not a JSON object.
	#[error("Configuration is not a valid JSON object.")]
	Parse {
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Target URL cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},

	/// A header name or value cannot be represented on the wire.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Header name as supplied by the caller.
		name: String,
	},
	/// A required key is absent or empty.
	#[error("Configuration is missing the `{key}` key.")]
	MissingKey {
		/// Name of the missing key.
		key: &'static str,
	},
	/// A key holds a value of the wrong type or an unknown variant.
	#[error("Configuration key `{key}` has an invalid value: {reason}.")]
	InvalidValue {
		/// Name of the offending key.
		key: &'static str,
		/// Human-readable explanation.
		reason: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL of the failed call.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: impl Into<String>, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url: url.into(), source: Box::new(src) }
	}
}

/// Reasons a bearer token could not be obtained from the token endpoint.
#[derive(Debug, ThisError)]
pub enum TokenError {
	/// The token endpoint could not be reached.
	#[error("Token endpoint could not be reached.")]
	Transport(#[source] TransportError),
	/// The token endpoint answered with a non-success status.
	#[error("Token endpoint responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: StatusCode,
	},
	/// The token endpoint body is not the expected `{"data":{...}}` envelope.
	#[error("Token endpoint returned a malformed payload.")]
	Malformed {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The payload carries no bearer token.
	#[error("Token payload is missing the `{field}` bearer field.")]
	MissingBearer {
		/// Field that was expected to hold the token.
		field: String,
	},
	/// The bearer token cannot be sent as a header value.
	#[error("Token payload carries a bearer that is not a valid header value.")]
	InvalidBearer,
	/// The payload carries no integer `expire_in`.
	#[error("Token payload is missing expire_in.")]
	MissingExpiry,
	/// The payload carries a zero or negative `expire_in`.
	#[error("The expire_in value must be positive.")]
	NonPositiveExpiry,
	/// The payload carries an `expire_in` beyond the supported range.
	#[error("The expire_in value {expire_in} exceeds the supported range.")]
	ExpiryOutOfRange {
		/// Lifetime in milliseconds as returned by the endpoint.
		expire_in: i64,
	},
}
