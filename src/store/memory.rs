//! Thread-safe in-memory store for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, UserId},
	crypto::SecretCipher,
	store::{ProfileRecord, ProfileStore, SealedPair, StoreError, StoreFuture, TokenVault},
};

/// Process-local vault and profile table; tokens are sealed even here.
#[derive(Clone, Debug)]
pub struct MemoryStore {
	cipher: SecretCipher,
	vault: Arc<RwLock<HashMap<UserId, SealedPair>>>,
	profiles: Arc<RwLock<HashMap<UserId, ProfileRecord>>>,
}
impl MemoryStore {
	/// Creates an empty store sealing with `cipher`.
	pub fn new(cipher: SecretCipher) -> Self {
		Self { cipher, vault: Default::default(), profiles: Default::default() }
	}

	/// Returns the at-rest form of a user's tokens.
	pub fn sealed_entry(&self, user: &UserId) -> Option<SealedPair> {
		self.vault.read().get(user).cloned()
	}

	fn store_now(&self, user: &UserId, pair: &TokenPair) -> Result<(), StoreError> {
		let sealed = SealedPair::seal(&self.cipher, pair)?;

		self.vault.write().insert(user.clone(), sealed);

		Ok(())
	}

	fn retrieve_now(&self, user: &UserId) -> Result<Option<TokenPair>, StoreError> {
		self.vault.read().get(user).map(|sealed| sealed.open(&self.cipher)).transpose()
	}
}
impl TokenVault for MemoryStore {
	fn store<'a>(&'a self, user: &'a UserId, pair: TokenPair) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.store_now(user, &pair) })
	}

	fn retrieve<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenPair>> {
		Box::pin(async move { self.retrieve_now(user) })
	}
}
impl ProfileStore for MemoryStore {
	fn mark_connected<'a>(
		&'a self,
		user: &'a UserId,
		expires_at: OffsetDateTime,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.profiles
				.write()
				.insert(user.clone(), ProfileRecord::connected(user.clone(), expires_at));

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<ProfileRecord>> {
		Box::pin(async move { Ok(self.profiles.read().get(user).cloned()) })
	}
}
