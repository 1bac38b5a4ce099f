//! Per-call request description.

// self
use crate::{
	_prelude::*,
	http::{FormData, RequestBody, headers},
};

/// Per-call request description consumed by [`Client::send`](crate::client::Client::send).
///
/// Headers set here apply to this call only and take precedence over the client's persistent
/// headers and the built-in defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Path (and optional query) relative to the client's host.
	pub uri: String,
	/// Extra query parameters appended to the URL.
	pub query: Vec<(String, String)>,
	/// Call-specific headers.
	pub headers: HeaderMap,
	/// Request body.
	pub body: RequestBody,
}
impl ApiRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, uri: impl Into<String>) -> Self {
		Self {
			method,
			uri: uri.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: RequestBody::Empty,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(uri: impl Into<String>) -> Self {
		Self::new(Method::GET, uri)
	}

	/// Shorthand for a `POST` request.
	pub fn post(uri: impl Into<String>) -> Self {
		Self::new(Method::POST, uri)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(uri: impl Into<String>) -> Self {
		Self::new(Method::PUT, uri)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(uri: impl Into<String>) -> Self {
		Self::new(Method::PATCH, uri)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(uri: impl Into<String>) -> Self {
		Self::new(Method::DELETE, uri)
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets a call-specific header, replacing earlier values of the same name.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Adds another value for `name`, keeping the ones already set.
	pub fn append_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.append(name, value);

		self
	}

	/// Validates and sets a call-specific header given as text.
	pub fn try_header(self, name: &str, value: &str) -> Result<Self> {
		let (name, value) = headers::parse_header(name, value)?;

		Ok(self.header(name, value))
	}

	/// Replaces the body.
	pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
		self.body = body.into();

		self
	}

	/// Encodes `body` as JSON.
	pub fn json<B>(self, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		Ok(self.body(RequestBody::json(body)?))
	}

	/// Attaches a multipart form.
	pub fn form(self, form: FormData) -> Self {
		self.body(form)
	}
}
