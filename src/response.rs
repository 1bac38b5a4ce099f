//! Forgiving JSON response wrapper.
//!
//! A [`Response`] keeps the decoded top-level JSON object in insertion order. Bodies that are not
//! valid JSON, or that decode to something other than an object, leave the map empty; the
//! [`DecodeOutcome`] records which of those happened so callers can tell a degraded body apart
//! from a genuinely empty object.

// self
use crate::{
	_prelude::*,
	http::{RawResponse, headers},
};

/// Result of decoding a raw body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeOutcome {
	#[default]
	/// The body was a JSON object and its keys were merged.
	Parsed,
	/// The body was not valid JSON; nothing was merged.
	Invalid,
	/// The body was valid JSON but not an object; nothing was merged.
	NotAnObject,
}
impl DecodeOutcome {
	/// Returns `true` unless the body was merged successfully.
	pub const fn is_degraded(self) -> bool {
		!matches!(self, Self::Parsed)
	}
}

/// Ordered key/value view over a decoded response body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
	status: StatusCode,
	headers: HeaderMap,
	data: Map<String, Value>,
	outcome: DecodeOutcome,
}
impl Response {
	/// Creates a response seeded with `data`.
	pub fn new(data: Map<String, Value>) -> Self {
		Self { data, ..Default::default() }
	}

	/// Decodes `raw` into a fresh response.
	pub fn from_raw_body(raw: &str) -> Self {
		let mut response = Self::default();

		response.merge_raw_body(raw);

		response
	}

	/// Builds a response from a transport result, keeping its status and headers.
	pub fn from_raw(raw: RawResponse) -> Self {
		let RawResponse { status, headers, body } = raw;
		let mut response = Self { status, headers, ..Default::default() };

		response.merge_raw_body(&body);

		response
	}

	/// Decodes `raw` and merges its keys into the current map, replacing existing ones.
	pub fn merge_raw_body(&mut self, raw: &str) -> DecodeOutcome {
		let outcome = match serde_json::from_str::<Value>(raw) {
			Ok(Value::Object(decoded)) => {
				self.data.extend(decoded);

				DecodeOutcome::Parsed
			},
			Ok(_) => DecodeOutcome::NotAnObject,
			Err(_) => DecodeOutcome::Invalid,
		};

		self.outcome = outcome;

		outcome
	}

	/// Outcome of the most recent body decode.
	pub fn decode_outcome(&self) -> DecodeOutcome {
		self.outcome
	}

	/// HTTP status code; `200 OK` when the response was not produced by a transport.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// All response headers, repeated names included.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// First value of header `name` as text; `None` when absent or not visible ASCII.
	pub fn header(&self, name: &str) -> Option<&str> {
		headers::header_str(&self.headers, name)
	}

	/// Every value sent under header `name`, in wire order.
	pub fn header_values(&self, name: &str) -> impl Iterator<Item = &HeaderValue> {
		self.headers.get_all(name).iter()
	}

	/// Raw value under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.data.get(key)
	}

	/// String value under `key`.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(Value::as_str)
	}

	/// Integer value under `key`.
	pub fn get_i64(&self, key: &str) -> Option<i64> {
		self.get(key).and_then(Value::as_i64)
	}

	/// Boolean value under `key`.
	pub fn get_bool(&self, key: &str) -> Option<bool> {
		self.get(key).and_then(Value::as_bool)
	}

	/// Returns `true` when `key` is present.
	pub fn has(&self, key: &str) -> bool {
		self.data.contains_key(key)
	}

	/// Keys in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.data.keys().map(String::as_str)
	}

	/// Entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.data.iter().map(|(key, value)| (key.as_str(), value))
	}

	/// Number of top-level keys.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Returns `true` when no keys are present.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Borrows the decoded map.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.data
	}

	/// Consumes the response and returns the decoded map.
	pub fn into_map(self) -> Map<String, Value> {
		self.data
	}
}
