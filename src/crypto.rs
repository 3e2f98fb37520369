//! AES-256-GCM sealing for token material at rest.
//!
//! Sealed values are `base64(nonce || ciphertext)` with a fresh 96-bit nonce per call, so the
//! same plaintext never produces the same output twice.

// crates.io
use aes_gcm::{
	Aes256Gcm, Nonce,
	aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;
// self
use crate::{_prelude::*, error::ConfigError};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Symmetric cipher used by stores to seal tokens.
#[derive(Clone)]
pub struct SecretCipher(Aes256Gcm);
impl SecretCipher {
	/// Builds a cipher from a base64-encoded 32-byte key.
	pub fn from_base64(key_b64: &str) -> Result<Self, ConfigError> {
		let key = STANDARD
			.decode(key_b64.trim())
			.map_err(|e| ConfigError::Cipher { reason: format!("key is not base64: {e}") })?;

		Self::from_key(&key)
	}

	/// Builds a cipher from raw key bytes.
	pub fn from_key(key: &[u8]) -> Result<Self, ConfigError> {
		if key.len() != KEY_LEN {
			return Err(ConfigError::Cipher {
				reason: format!("key must be {KEY_LEN} bytes, got {}", key.len()),
			});
		}

		let cipher = Aes256Gcm::new_from_slice(key)
			.map_err(|e| ConfigError::Cipher { reason: e.to_string() })?;

		Ok(Self(cipher))
	}

	/// Generates a random key; sealed data does not survive the process.
	pub fn generate() -> Self {
		let mut key = [0_u8; KEY_LEN];

		rand::rng().fill_bytes(&mut key);

		Self(Aes256Gcm::new(&key.into()))
	}

	/// Seals `plaintext` into `base64(nonce || ciphertext)`.
	pub fn seal(&self, plaintext: &str) -> Result<String, ConfigError> {
		let mut nonce = [0_u8; NONCE_LEN];

		rand::rng().fill_bytes(&mut nonce);

		let ciphertext = self
			.0
			.encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
			.map_err(|e| ConfigError::Cipher { reason: format!("encryption failed: {e}") })?;
		let mut combined = nonce.to_vec();

		combined.extend_from_slice(&ciphertext);

		Ok(STANDARD.encode(combined))
	}

	/// Opens a value produced by [`seal`](Self::seal).
	pub fn open(&self, sealed: &str) -> Result<String, ConfigError> {
		let combined = STANDARD
			.decode(sealed)
			.map_err(|e| ConfigError::Cipher {
				reason: format!("sealed value is not base64: {e}"),
			})?;

		if combined.len() <= NONCE_LEN {
			return Err(ConfigError::Cipher { reason: "sealed value is truncated".into() });
		}

		let (nonce, ciphertext) = combined.split_at(NONCE_LEN);
		let plaintext = self
			.0
			.decrypt(Nonce::from_slice(nonce), ciphertext)
			.map_err(|e| ConfigError::Cipher { reason: format!("decryption failed: {e}") })?;

		String::from_utf8(plaintext)
			.map_err(|e| ConfigError::Cipher { reason: format!("plaintext is not UTF-8: {e}") })
	}
}
impl Debug for SecretCipher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("SecretCipher(..)")
	}
}
