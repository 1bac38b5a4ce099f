//! Outbound request bodies: JSON documents and multipart forms.

// self
use crate::_prelude::*;

/// Body attached to an outbound request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
	#[default]
	/// No body.
	Empty,
	/// JSON document sent with `Content-Type: application/json`.
	Json(Value),
	/// Multipart form; the transport chooses the boundary and content type.
	Form(FormData),
}
impl RequestBody {
	/// Encodes any serializable value as a JSON body.
	pub fn json<T>(body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		serde_json::to_value(body).map(Self::Json).map_err(|source| Error::Body { source })
	}

	/// Returns `true` for multipart bodies.
	pub fn is_form(&self) -> bool {
		matches!(self, Self::Form(_))
	}
}
impl From<Value> for RequestBody {
	fn from(value: Value) -> Self {
		Self::Json(value)
	}
}
impl From<Option<Value>> for RequestBody {
	fn from(value: Option<Value>) -> Self {
		value.map(Self::Json).unwrap_or_default()
	}
}
impl From<FormData> for RequestBody {
	fn from(form: FormData) -> Self {
		Self::Form(form)
	}
}

/// Single multipart form part.
#[derive(Clone, PartialEq, Eq)]
pub enum FormValue {
	/// Plain text field.
	Text(String),
	/// File upload.
	File {
		/// File name reported to the server.
		file_name: String,
		/// MIME type, when known.
		content_type: Option<String>,
		/// File contents.
		bytes: Vec<u8>,
	},
}
impl Debug for FormValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Text(value) => f.debug_tuple("Text").field(value).finish(),
			Self::File { file_name, content_type, bytes } => f
				.debug_struct("File")
				.field("file_name", file_name)
				.field("content_type", content_type)
				.field("len", &bytes.len())
				.finish(),
		}
	}
}

/// Ordered multipart form fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData(Vec<(String, FormValue)>);
impl FormData {
	/// Creates an empty form.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.push((name.into(), FormValue::Text(value.into())));

		self
	}

	/// Appends a file field without an explicit MIME type.
	pub fn file(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		bytes: impl Into<Vec<u8>>,
	) -> Self {
		self.0.push((
			name.into(),
			FormValue::File { file_name: file_name.into(), content_type: None, bytes: bytes.into() },
		));

		self
	}

	/// Appends a file field with a MIME type.
	pub fn file_with_type(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		content_type: impl Into<String>,
		bytes: impl Into<Vec<u8>>,
	) -> Self {
		self.0.push((
			name.into(),
			FormValue::File {
				file_name: file_name.into(),
				content_type: Some(content_type.into()),
				bytes: bytes.into(),
			},
		));

		self
	}

	/// Iterates fields in insertion order.
	pub fn fields(&self) -> impl Iterator<Item = (&str, &FormValue)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}

	/// Looks up the first field named `name`.
	pub fn get(&self, name: &str) -> Option<&FormValue> {
		self.0.iter().find(|(key, _)| key == name).map(|(_, value)| value)
	}

	/// Number of fields.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when the form has no fields.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
