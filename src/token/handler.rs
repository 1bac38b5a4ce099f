//! Pluggable persistence for full [`Token`] payloads.

// self
use crate::{
	_prelude::*,
	store::{StoreError, StoreFuture, TokenStore},
	token::{MAX_EXPIRE_IN, Token},
};

/// Persistence contract for issued tokens, keyed by a fixed storage key.
pub trait TokenHandler
where
	Self: Send + Sync,
{
	/// Key under which this handler keeps its token.
	fn storage_key(&self) -> &str;

	/// Persists `token`, replacing any previously kept one.
	fn keep_token(&self, token: Token) -> StoreFuture<'_, ()>;

	/// Returns the kept token, or [`Token::default`] when nothing is stored.
	fn get_token(&self) -> StoreFuture<'_, Token>;
}

/// [`TokenHandler`] that serializes tokens into any [`TokenStore`].
///
/// Entries live for the token's `expire_in` milliseconds, capped at [`MAX_EXPIRE_IN`]; payloads
/// without a positive lifetime fall back to [`fallback_ttl`](Self::with_fallback_ttl).
#[derive(Clone)]
pub struct StoreTokenHandler {
	key: String,
	store: Arc<dyn TokenStore>,
	fallback_ttl: Duration,
}
impl StoreTokenHandler {
	const DEFAULT_FALLBACK_TTL: Duration = Duration::hours(1);

	/// Creates a handler that keeps tokens under `key` in `store`.
	pub fn new(key: impl Into<String>, store: Arc<dyn TokenStore>) -> Self {
		Self { key: key.into(), store, fallback_ttl: Self::DEFAULT_FALLBACK_TTL }
	}

	/// Overrides the TTL used for payloads without a positive `expire_in`.
	pub fn with_fallback_ttl(mut self, ttl: Duration) -> Self {
		self.fallback_ttl = if ttl.is_negative() { Duration::ZERO } else { ttl };

		self
	}

	fn ttl_for(&self, token: &Token) -> Duration {
		match token.expire_in() {
			ms if ms > 0 => Duration::milliseconds(ms).min(MAX_EXPIRE_IN),
			_ => self.fallback_ttl,
		}
	}
}
impl TokenHandler for StoreTokenHandler {
	fn storage_key(&self) -> &str {
		&self.key
	}

	fn keep_token(&self, token: Token) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let ttl = self.ttl_for(&token);
			let encoded = serde_json::to_string(&token).map_err(|e| StoreError::Serialization {
				message: format!("Failed to encode token: {e}"),
			})?;

			self.store.set(&self.key, encoded, ttl).await
		})
	}

	fn get_token(&self) -> StoreFuture<'_, Token> {
		Box::pin(async move {
			let Some(encoded) = self.store.get(&self.key).await? else {
				return Ok(Token::default());
			};

			serde_json::from_str(&encoded).map_err(|e| StoreError::Serialization {
				message: format!("Failed to decode token stored under {}: {e}", self.key),
			})
		})
	}
}
impl Debug for StoreTokenHandler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StoreTokenHandler")
			.field("key", &self.key)
			.field("fallback_ttl", &self.fallback_ttl)
			.finish()
	}
}
