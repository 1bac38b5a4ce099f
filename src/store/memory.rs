//! Thread-safe in-memory [`TokenStore`] implementation for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	store::{StoreEntry, StoreError, StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<String, StoreEntry>>>;

/// Thread-safe storage backend that keeps entries in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns the remaining lifetime of a live entry.
	pub fn ttl_of(&self, key: &str) -> Option<Duration> {
		let now = OffsetDateTime::now_utc();

		self.0
			.read()
			.get(key)
			.filter(|entry| !entry.is_expired_at(now))
			.map(|entry| entry.expires_at - now)
	}

	/// Number of entries held, including expired ones not yet evicted.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no entries are held.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: StoreMap, key: &str, now: OffsetDateTime) -> Option<String> {
		match map.read().get(key) {
			Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
			Some(_) => {},
			None => return None,
		}

		Self::evict_expired(&map, key, now)
	}

	// A writer may have refreshed the key after the read lock was released.
	fn evict_expired(map: &StoreMap, key: &str, now: OffsetDateTime) -> Option<String> {
		let mut guard = map.write();

		if guard.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
			guard.remove(key);
		}

		guard.get(key).map(|entry| entry.value.clone())
	}

	fn set_now(map: StoreMap, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
		let entry = StoreEntry::new(value, OffsetDateTime::now_utc(), ttl)?;

		map.write().insert(key.to_owned(), entry);

		Ok(())
	}
}
impl TokenStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, key, OffsetDateTime::now_utc())) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::set_now(map, key, value, ttl) })
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(key);

			Ok(())
		})
	}
}
