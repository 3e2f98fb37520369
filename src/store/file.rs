//! File-backed store for single-node deployments.
//!
//! The whole state (sealed vault plus profile table) lives in one JSON snapshot that is
//! rewritten atomically after each mutation: write a sibling `.tmp`, fsync, rename over.
//! Mutations are applied to a copy and only become visible once the file write succeeded.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, UserId},
	crypto::SecretCipher,
	store::{ProfileRecord, ProfileStore, SealedPair, StoreError, StoreFuture, TokenVault},
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Snapshot {
	#[serde(default)]
	vault: BTreeMap<UserId, SealedPair>,
	#[serde(default)]
	profiles: BTreeMap<UserId, ProfileRecord>,
}

/// Persists sealed tokens and profiles to a JSON file.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	cipher: SecretCipher,
	inner: Arc<RwLock<Snapshot>>,
	writer: Arc<Mutex<()>>,
}
impl FileStore {
	/// Opens (or creates) a store at `path`, eagerly loading existing data.
	///
	/// The same key must be supplied on every open; entries sealed under another key fail to
	/// decrypt on retrieval.
	pub fn open(path: impl Into<PathBuf>, cipher: SecretCipher) -> Result<Self, StoreError> {
		let path = path.into();

		ensure_parent_exists(&path)?;

		let snapshot = load_snapshot(&path)?;

		Ok(Self {
			path,
			cipher,
			inner: Arc::new(RwLock::new(snapshot)),
			writer: Arc::new(Mutex::new(())),
		})
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn commit<F>(&self, apply: F) -> StoreFuture<'_, ()>
	where
		F: 'static + Send + FnOnce(&mut Snapshot),
	{
		let store = self.clone();

		Box::pin(async move {
			tokio::task::spawn_blocking(move || store.commit_blocking(apply)).await.map_err(|e| {
				StoreError::Backend { message: format!("Store writer task failed: {e}") }
			})?
		})
	}

	fn commit_blocking<F>(&self, apply: F) -> Result<(), StoreError>
	where
		F: FnOnce(&mut Snapshot),
	{
		let _writer = self.writer.lock();
		let mut next = self.inner.read().clone();

		apply(&mut next);
		self.persist(&next)?;

		*self.inner.write() = next;

		Ok(())
	}

	fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
		ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| backend("create", &tmp_path, e))?;

			file.write_all(&serialized).map_err(|e| backend("write", &tmp_path, e))?;
			file.sync_all().map_err(|e| backend("sync", &tmp_path, e))?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| backend("replace", &self.path, e))
	}
}
impl TokenVault for FileStore {
	fn store<'a>(&'a self, user: &'a UserId, pair: TokenPair) -> StoreFuture<'a, ()> {
		let user = user.clone();

		Box::pin(async move {
			let sealed = SealedPair::seal(&self.cipher, &pair)?;

			self.commit(move |snapshot| {
				snapshot.vault.insert(user, sealed);
			})
			.await
		})
	}

	fn retrieve<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenPair>> {
		Box::pin(async move {
			let sealed = self.inner.read().vault.get(user).cloned();

			sealed.map(|sealed| sealed.open(&self.cipher)).transpose()
		})
	}
}
impl ProfileStore for FileStore {
	fn mark_connected<'a>(
		&'a self,
		user: &'a UserId,
		expires_at: OffsetDateTime,
	) -> StoreFuture<'a, ()> {
		let record = ProfileRecord::connected(user.clone(), expires_at);
		let user = user.clone();

		self.commit(move |snapshot| {
			snapshot.profiles.insert(user, record);
		})
	}

	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<ProfileRecord>> {
		Box::pin(async move { Ok(self.inner.read().profiles.get(user).cloned()) })
	}
}

fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
	if !path.exists() {
		return Ok(Snapshot::default());
	}

	let bytes = fs::read(path).map_err(|e| backend("read", path, e))?;

	if bytes.is_empty() {
		return Ok(Snapshot::default());
	}

	serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
		message: format!("Failed to parse {}: {e}", path.display()),
	})
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| backend("create directory", parent, e))?;
	}

	Ok(())
}

fn backend(action: &str, path: &Path, e: std::io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {e}", path.display()) }
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;
	use crate::auth::TokenSecret;

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"spotify_auth_gateway_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn pair() -> TokenPair {
		TokenPair {
			access_token: TokenSecret::new("BQD-file-access"),
			refresh_token: TokenSecret::new("AQB-file-refresh"),
		}
	}

	#[tokio::test]
	async fn snapshot_survives_reopen_and_stays_sealed() {
		let path = temp_path("reopen");
		let cipher = SecretCipher::generate();
		let user = UserId::new("u1").expect("User fixture should be valid.");
		let expires_at = time::macros::datetime!(2025-06-01 13:00 UTC);
		let store = FileStore::open(&path, cipher.clone()).expect("Store should open.");

		store.store(&user, pair()).await.expect("Store should succeed.");
		store.mark_connected(&user, expires_at).await.expect("Mark should succeed.");
		drop(store);

		let raw = fs::read_to_string(&path).expect("Snapshot should exist on disk.");

		assert!(!raw.contains("BQD-file-access"));
		assert!(!raw.contains("AQB-file-refresh"));
		assert!(!path.with_extension("tmp").exists());

		let reopened = FileStore::open(&path, cipher).expect("Store should reopen.");

		assert_eq!(
			reopened.retrieve(&user).await.expect("Retrieve should succeed."),
			Some(pair())
		);
		assert_eq!(
			reopened
				.fetch(&user)
				.await
				.expect("Fetch should succeed.")
				.and_then(|profile| profile.access_token_expires_at),
			Some(expires_at)
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary store snapshot {}: {e}", path.display())
		});
	}

	#[tokio::test]
	async fn foreign_key_cannot_read_reopened_vault() {
		let path = temp_path("rekey");
		let user = UserId::new("u2").expect("User fixture should be valid.");
		let store = FileStore::open(&path, SecretCipher::generate()).expect("Store should open.");

		store.store(&user, pair()).await.expect("Store should succeed.");
		drop(store);

		let reopened =
			FileStore::open(&path, SecretCipher::generate()).expect("Store should reopen.");

		assert!(matches!(reopened.retrieve(&user).await, Err(StoreError::Cipher { .. })));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary store snapshot {}: {e}", path.display())
		});
	}

	#[tokio::test]
	async fn failed_writes_leave_memory_untouched() {
		let path = temp_path("unwritable");
		let user = UserId::new("u3").expect("User fixture should be valid.");
		let store = FileStore::open(&path, SecretCipher::generate()).expect("Store should open.");

		// A directory at the snapshot path makes the final rename fail.
		fs::create_dir(&path).expect("Fixture directory should be creatable.");

		assert!(matches!(store.store(&user, pair()).await, Err(StoreError::Backend { .. })));
		assert!(matches!(
			store.mark_connected(&user, OffsetDateTime::UNIX_EPOCH).await,
			Err(StoreError::Backend { .. })
		));
		assert_eq!(store.retrieve(&user).await.expect("Retrieve should succeed."), None);
		assert_eq!(store.fetch(&user).await.expect("Fetch should succeed."), None);

		let _ = fs::remove_file(path.with_extension("tmp"));

		fs::remove_dir(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary store directory {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_snapshots_fail_to_open() {
		let path = temp_path("corrupt");

		fs::write(&path, b"{not json").expect("Fixture file should be writable.");

		assert!(matches!(
			FileStore::open(&path, SecretCipher::generate()),
			Err(StoreError::Serialization { .. })
		));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary store snapshot {}: {e}", path.display())
		});
	}
}
