//! Transport primitives for outbound service calls.
//!
//! The module exposes [`HttpTransport`] alongside the transport-agnostic [`OutboundRequest`] and
//! [`RawResponse`] so downstream crates can plug in custom HTTP stacks (or test doubles) without
//! touching the client. The client resolves URLs, headers, and bodies before a request reaches
//! the transport; implementations only move bytes.

pub mod body;
pub mod headers;

pub use body::*;
pub use headers::*;

// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::Config, error::ConfigError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a fully prepared request.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared across
/// clients behind an [`Arc`]. Non-2xx statuses are not errors at this layer; they are reported
/// through [`RawResponse::status`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and collects the full response body.
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_>;
}

/// Fully resolved request handed to an [`HttpTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute target URL, query included.
	pub url: Url,
	/// Final header set.
	pub headers: HeaderMap,
	/// Request body.
	pub body: RequestBody,
}

/// Transport result: status, every header value, and the body as text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers, repeated names included.
	pub headers: HeaderMap,
	/// Response body decoded as text.
	pub body: String,
}
impl RawResponse {
	/// Builds a response with no headers.
	pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the configured request and connect timeouts.
	pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(std_duration(config.timeout()))
			.connect_timeout(std_duration(config.connect_timeout()))
			.build()?;

		Ok(Self(client))
	}

	fn build_request(
		&self,
		request: OutboundRequest,
	) -> Result<reqwest::RequestBuilder, TransportError> {
		let OutboundRequest { method, url, headers, body } = request;
		let builder = self.0.request(method, url).headers(headers);
		let builder = match body {
			RequestBody::Empty => builder,
			RequestBody::Json(value) => builder.body(value.to_string()),
			RequestBody::Form(form) => builder.multipart(multipart_form(form)?),
		};

		Ok(builder)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let url = request.url.to_string();
			let response = self
				.build_request(request)?
				.send()
				.await
				.map_err(|e| TransportError::network(&url, e))?;
			let status = response.status();
			let headers = response.headers().clone();
			let body = response.text().await.map_err(|e| TransportError::network(&url, e))?;

			Ok(RawResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn multipart_form(form: FormData) -> Result<reqwest::multipart::Form, TransportError> {
	let mut multipart = reqwest::multipart::Form::new();

	for (name, value) in form.fields() {
		multipart = match value {
			FormValue::Text(text) => multipart.text(name.to_owned(), text.clone()),
			FormValue::File { file_name, content_type, bytes } => {
				let mut part =
					reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());

				if let Some(mime) = content_type {
					part = part
						.mime_str(mime)
						.map_err(|e| TransportError::network(format!("multipart:{name}"), e))?;
				}

				multipart.part(name.to_owned(), part)
			},
		};
	}

	Ok(multipart)
}

#[cfg(feature = "reqwest")]
fn std_duration(duration: Duration) -> std::time::Duration {
	duration.try_into().unwrap_or_default()
}
