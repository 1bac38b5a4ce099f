//! Key/value token stores with per-entry time-to-live.
//!
//! A [`TokenStore`] plays the role of a cookie jar: the client reads a cached bearer token by
//! key and writes freshly issued tokens with a TTL. Expired entries behave exactly like absent
//! ones.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for cached tokens.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the live value stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Stores `value` under `key` for `ttl`, replacing any previous entry.
	fn set<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> StoreFuture<'a, ()>;

	/// Removes the entry stored under `key`, if present.
	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// The requested lifetime puts the expiry outside the representable range.
	#[error("TTL of {ttl_ms} ms is out of range.")]
	TtlOutOfRange {
		/// Requested lifetime in milliseconds.
		ttl_ms: i128,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Stored value together with its absolute expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
	/// Stored value.
	pub value: String,
	/// Instant after which the entry is treated as absent.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl StoreEntry {
	/// Builds an entry that expires `ttl` after `now`.
	pub fn new(value: String, now: OffsetDateTime, ttl: Duration) -> Result<Self, StoreError> {
		let expires_at = now
			.checked_add(ttl)
			.ok_or(StoreError::TtlOutOfRange { ttl_ms: ttl.whole_milliseconds() })?;

		Ok(Self { value, expires_at })
	}

	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
