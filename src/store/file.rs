//! JSON-file [`TokenStore`] so cached tokens outlive the process.

// std
use std::{
	fs,
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{StoreEntry, StoreError, StoreFuture, TokenStore},
};

type Snapshot = HashMap<String, StoreEntry>;

/// Store that rewrites one JSON file after every mutation.
///
/// The file holds a single object mapping keys to [`StoreEntry`] values. Writes go to a sibling
/// `.tmp` file first and are renamed over the target, so readers never observe a torn snapshot.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens the store at `path`; expired entries are dropped.
	///
	/// A missing file opens as an empty store. Parent directories are created on the first write.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();
		let now = OffsetDateTime::now_utc();
		let mut entries = read_snapshot(&path)?;

		entries.retain(|_, entry| !entry.is_expired_at(now));

		Ok(Self { path, entries: Arc::new(RwLock::new(entries)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn flush(&self, entries: &Snapshot) -> Result<(), StoreError> {
		let bytes = serde_json::to_vec(entries).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode {}: {e}", self.path.display()),
		})?;

		write_atomically(&self.path, &bytes).map_err(|e| StoreError::Backend {
			message: format!("Failed to write {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();
			let entries = self.entries.read();

			Ok(entries.get(key).filter(|entry| !entry.is_expired_at(now)).map(|e| e.value.clone()))
		})
	}

	fn set<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();
			let entry = StoreEntry::new(value, now, ttl)?;
			let mut entries = self.entries.write();
			let mut next = entries.clone();

			next.retain(|_, existing| !existing.is_expired_at(now));
			next.insert(key.to_owned(), entry);
			self.flush(&next)?;
			*entries = next;

			Ok(())
		})
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut entries = self.entries.write();

			if !entries.contains_key(key) {
				return Ok(());
			}

			let mut next = entries.clone();

			next.remove(key);
			self.flush(&next)?;
			*entries = next;

			Ok(())
		})
	}
}

fn read_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
	let bytes = match fs::read(path) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::new()),
		Err(e) =>
			return Err(StoreError::Backend {
				message: format!("Failed to read {}: {e}", path.display()),
			}),
	};

	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Ok(Snapshot::new());
	}

	serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
		message: format!("Failed to parse {}: {e}", path.display()),
	})
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
	if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
		fs::create_dir_all(parent)?;
	}

	let staging = path.with_extension("tmp");
	let mut file = fs::File::create(&staging)?;

	file.write_all(bytes)?;
	file.sync_all()?;
	drop(file);

	fs::rename(&staging, path)
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;

	fn scratch(tag: &str) -> PathBuf {
		env::temp_dir().join(format!(
			"microservices_client_file_store_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		))
	}

	#[test]
	fn missing_and_blank_files_open_empty() {
		let path = scratch("blank");
		let missing = FileStore::open(&path).expect("Missing file should open as empty.");

		assert!(missing.entries.read().is_empty());

		fs::write(&path, "  \n").expect("Scratch file should be writable.");

		let blank = FileStore::open(&path).expect("Blank file should open as empty.");

		assert!(blank.entries.read().is_empty());

		fs::write(&path, "[1,2]").expect("Scratch file should be writable.");

		assert!(matches!(FileStore::open(&path), Err(StoreError::Serialization { .. })));

		fs::remove_file(&path).expect("Scratch file should be removable.");
	}

	#[test]
	fn failed_writes_leave_the_snapshot_untouched() {
		let dir = scratch("blocked");
		let store = FileStore::open(dir.join("tokens.json")).expect("Fresh store should open.");
		let rt = Runtime::new().expect("Tokio runtime should build.");

		// A regular file where the parent directory should be makes every flush fail.
		fs::write(&dir, "not a directory").expect("Scratch file should be writable.");

		let err = rt
			.block_on(store.set("token", "abc".into(), Duration::hours(1)))
			.expect_err("Writing below a regular file must fail.");

		assert!(matches!(err, StoreError::Backend { .. }));
		assert_eq!(rt.block_on(store.get("token")).expect("Reads should still work."), None);

		let err = rt
			.block_on(store.set("token", "abc".into(), Duration::MAX))
			.expect_err("An unrepresentable expiry must be rejected.");

		assert!(matches!(err, StoreError::TtlOutOfRange { .. }));

		fs::remove_file(&dir).expect("Scratch file should be removable.");
	}

	#[test]
	fn writes_prune_expired_entries() {
		let path = scratch("prune");
		let store = FileStore::open(&path).expect("Fresh store should open.");
		let rt = Runtime::new().expect("Tokio runtime should build.");

		rt.block_on(store.set("stale", "old".into(), Duration::seconds(-1)))
			.expect("Stale entry should be written.");
		rt.block_on(store.set("fresh", "new".into(), Duration::hours(1)))
			.expect("Fresh entry should be written.");

		let on_disk: Snapshot =
			serde_json::from_slice(&fs::read(store.path()).expect("Snapshot should be readable."))
				.expect("Snapshot should be valid JSON.");

		assert_eq!(on_disk.keys().collect::<Vec<_>>(), vec!["fresh"]);
		assert!(!path.with_extension("tmp").exists());

		rt.block_on(store.remove("fresh")).expect("Remove should succeed.");

		assert!(store.entries.read().is_empty());

		fs::remove_file(&path).expect("Scratch file should be removable.");
	}
}
