//! Token records produced by the provider and carried between flows and stores.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::ConfigError};

/// Seconds shaved off an app token's lifetime so in-flight requests never race its expiry.
pub const APP_TOKEN_EXPIRY_MARGIN: Duration = Duration::seconds(300);

/// Lifecycle status for a cached token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// Token is usable.
	Active,
	/// Token reached its (margin-adjusted) expiry instant.
	Expired,
}

/// Parsed token endpoint response, independent of any grant.
#[derive(Clone)]
pub struct TokenGrant {
	/// Bearer token.
	pub access_token: TokenSecret,
	/// Refresh token, when the provider issued or rotated one.
	pub refresh_token: Option<TokenSecret>,
	/// Positive lifetime reported by the provider.
	pub expires_in: Duration,
}
impl TokenGrant {
	/// Validates a raw `expires_in` value before building the grant.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: Option<String>,
		expires_in: Option<std::time::Duration>,
	) -> Result<Self, ConfigError> {
		let secs = expires_in.ok_or(ConfigError::MissingExpiresIn)?.as_secs();
		let secs = i64::try_from(secs).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		if secs <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn);
		}

		Ok(Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: refresh_token.map(TokenSecret::new),
			expires_in: Duration::seconds(secs),
		})
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// App-only bearer token held by [`AppTokenCache`](crate::flows::AppTokenCache).
#[derive(Clone)]
pub struct AppToken {
	/// Bearer token value.
	pub value: TokenSecret,
	/// Margin-adjusted expiry; the token is served only while `now < expires_at`.
	pub expires_at: OffsetDateTime,
}
impl AppToken {
	/// Builds a cache entry from a client-credentials grant issued at `now`.
	pub fn from_grant(grant: TokenGrant, now: OffsetDateTime) -> Self {
		let lifetime = (grant.expires_in - APP_TOKEN_EXPIRY_MARGIN).max(Duration::ZERO);

		Self { value: grant.access_token, expires_at: now + lifetime }
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant < self.expires_at { TokenStatus::Active } else { TokenStatus::Expired }
	}

	/// Whole seconds left before the margin-adjusted expiry.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> i64 {
		(self.expires_at - instant).whole_seconds().max(0)
	}
}
impl Debug for AppToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppToken")
			.field("value", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Secret material routed through the [`TokenVault`](crate::store::TokenVault).
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
	/// Short-lived user-scoped bearer token.
	pub access_token: TokenSecret,
	/// Long-lived credential used to mint new access tokens.
	pub refresh_token: TokenSecret,
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenPair(<redacted>)")
	}
}

/// Outcome of an authorization-code exchange or a refresh.
#[derive(Clone)]
pub struct IssuedTokens {
	/// Pair that was written to the vault.
	pub pair: TokenPair,
	/// Lifetime reported by the provider.
	pub expires_in: Duration,
	/// Absolute expiry recorded on the user's profile.
	pub expires_at: OffsetDateTime,
}
impl Debug for IssuedTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedTokens")
			.field("pair", &self.pair)
			.field("expires_in", &self.expires_in)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
