//! Storage contracts for user token material and the client-visible profile table.
//!
//! Token pairs live in a [`TokenVault`] and are sealed with [`SecretCipher`] before they touch
//! any backing map or file. The [`ProfileStore`] only ever learns whether a user is connected
//! and when their access token expires; [`ProfileRecord`] has no field that could hold a token.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret, UserId},
	crypto::SecretCipher,
};

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Encrypted-at-rest home for each user's access and refresh tokens.
pub trait TokenVault
where
	Self: Send + Sync,
{
	/// Inserts or replaces the pair for `user`.
	fn store<'a>(&'a self, user: &'a UserId, pair: TokenPair) -> StoreFuture<'a, ()>;

	/// Returns the decrypted pair for `user`, if one was stored.
	fn retrieve<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenPair>>;
}

/// Non-secret per-user connection state readable by the client application.
pub trait ProfileStore
where
	Self: Send + Sync,
{
	/// Sets `connected = true` and records the access token's expiry.
	fn mark_connected<'a>(
		&'a self,
		user: &'a UserId,
		expires_at: OffsetDateTime,
	) -> StoreFuture<'a, ()>;

	/// Fetches the profile for `user`, if present.
	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<ProfileRecord>>;
}

/// Client-visible connection state for one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
	/// Owner of the record.
	pub user_id: UserId,
	/// Whether a token pair has been stored for the user.
	pub connected: bool,
	/// Expiry of the most recently issued access token.
	#[serde(with = "time::serde::rfc3339::option")]
	pub access_token_expires_at: Option<OffsetDateTime>,
}
impl ProfileRecord {
	/// Builds a connected record.
	pub fn connected(user_id: UserId, expires_at: OffsetDateTime) -> Self {
		Self { user_id, connected: true, access_token_expires_at: Some(expires_at) }
	}
}

/// Token pair as it sits at rest: each secret is `base64(nonce || ciphertext)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPair {
	/// Sealed access token.
	pub access_token: String,
	/// Sealed refresh token.
	pub refresh_token: String,
}
impl SealedPair {
	pub(crate) fn seal(cipher: &SecretCipher, pair: &TokenPair) -> Result<Self, StoreError> {
		Ok(Self {
			access_token: cipher.seal(pair.access_token.expose()).map_err(StoreError::cipher)?,
			refresh_token: cipher.seal(pair.refresh_token.expose()).map_err(StoreError::cipher)?,
		})
	}

	pub(crate) fn open(&self, cipher: &SecretCipher) -> Result<TokenPair, StoreError> {
		Ok(TokenPair {
			access_token: TokenSecret::new(
				cipher.open(&self.access_token).map_err(StoreError::cipher)?,
			),
			refresh_token: TokenSecret::new(
				cipher.open(&self.refresh_token).map_err(StoreError::cipher)?,
			),
		})
	}
}

/// Error type produced by [`TokenVault`] and [`ProfileStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Snapshot could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Sealing or opening token material failed.
	#[error("Cipher failure: {message}.")]
	Cipher {
		/// Human-readable error payload.
		message: String,
	},
}
impl StoreError {
	fn cipher(e: impl Display) -> Self {
		Self::Cipher { message: e.to_string() }
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_gateway_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let gateway_error: Error = store_error.clone().into();

		assert!(matches!(gateway_error, Error::Storage(_)));
		assert!(gateway_error.to_string().contains("disk full"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn sealed_pairs_hide_plaintext_and_open_back() {
		let cipher = SecretCipher::generate();
		let pair = TokenPair {
			access_token: TokenSecret::new("BQD-access"),
			refresh_token: TokenSecret::new("AQB-refresh"),
		};
		let sealed = SealedPair::seal(&cipher, &pair).expect("Sealing should succeed.");
		let json = serde_json::to_string(&sealed).expect("Sealed pair should serialize.");

		assert!(!json.contains("BQD-access"));
		assert!(!json.contains("AQB-refresh"));
		assert_eq!(sealed.open(&cipher).expect("Opening should succeed."), pair);
		assert!(matches!(
			sealed.open(&SecretCipher::generate()),
			Err(StoreError::Cipher { .. })
		));
	}

	#[test]
	fn profile_record_serializes_expiry_as_rfc3339() {
		let record = ProfileRecord::connected(
			UserId::new("u1").expect("User fixture should be valid."),
			time::macros::datetime!(2025-06-01 13:00 UTC),
		);
		let json = serde_json::to_value(&record).expect("Profile should serialize.");

		assert_eq!(json["user_id"], "u1");
		assert_eq!(json["connected"], true);
		assert_eq!(json["access_token_expires_at"], "2025-06-01T13:00:00Z");
	}
}
