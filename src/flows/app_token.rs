//! Client-credentials flow with a process-wide cached app token.
//!
//! [`AppTokenCache`] keeps at most one token. A hit (`now < expires_at`) never touches the
//! network. A miss takes the single-flight guard, re-checks the slot, and only then performs one
//! `grant_type=client_credentials` exchange, so concurrent cold callers share a single fetch.
//! Failed fetches leave the slot untouched.

// self
use crate::{
	_prelude::*,
	auth::{AppToken, TokenGrant, TokenStatus},
	clock::Clock,
	flows::Broker,
	http::TokenHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind},
};

/// Single-slot cache for the app-only bearer token.
#[derive(Debug, Default)]
pub struct AppTokenCache {
	slot: Mutex<Option<AppToken>>,
	fetch_guard: AsyncMutex<()>,
}
impl AppTokenCache {
	/// Returns the cached token if it is still fresh at `now`.
	pub fn peek(&self, now: OffsetDateTime) -> Option<AppToken> {
		self.slot
			.lock()
			.as_ref()
			.filter(|token| token.status_at(now) == TokenStatus::Active)
			.cloned()
	}

	/// Returns the cached token or runs `fetch` exactly once to replace it.
	pub async fn get_or_fetch<F, Fut>(&self, clock: &dyn Clock, fetch: F) -> Result<AppToken>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<TokenGrant>>,
	{
		if let Some(token) = self.peek(clock.now()) {
			return Ok(token);
		}

		let _singleflight = self.fetch_guard.lock().await;

		if let Some(token) = self.peek(clock.now()) {
			return Ok(token);
		}

		let grant = fetch().await?;
		let token = AppToken::from_grant(grant, clock.now());

		tracing::info!(expires_at = %token.expires_at, "cached new app token");

		*self.slot.lock() = Some(token.clone());

		Ok(token)
	}

	/// Drops the cached token so the next call refetches.
	pub fn invalidate(&self) {
		self.slot.lock().take();
	}
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Performs one uncached `client_credentials` exchange.
	pub async fn request_client_credentials(&self) -> Result<TokenGrant> {
		obs::observe(FlowKind::ClientCredentials, "request_client_credentials", async move {
			let facade = self.facade()?;

			facade.exchange_client_credentials(self.strategy.as_ref()).await
		})
		.await
	}

	/// Returns the broker's cached app token, fetching one when it is missing or stale.
	pub async fn client_credentials(&self) -> Result<AppToken> {
		self.app_token
			.get_or_fetch(self.clock.as_ref(), || self.request_client_credentials())
			.await
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::clock::ManualClock;

	fn grant(secs: u64) -> TokenGrant {
		TokenGrant::new(format!("app-{secs}"), None, Some(std::time::Duration::from_secs(secs)))
			.expect("Grant fixture should be valid.")
	}

	#[tokio::test]
	async fn hit_skips_fetch_and_expiry_refetches_once() {
		let clock = ManualClock::new(time::macros::datetime!(2025-06-01 12:00 UTC));
		let cache = AppTokenCache::default();
		let calls = AtomicUsize::new(0);
		let counter = &calls;
		let fetch = || async move {
			counter.fetch_add(1, Ordering::SeqCst);

			Ok(grant(3600))
		};

		cache.get_or_fetch(&clock, fetch).await.expect("Cold fetch should succeed.");
		cache.get_or_fetch(&clock, fetch).await.expect("Warm hit should succeed.");

		assert_eq!(calls.load(Ordering::SeqCst), 1);

		clock.advance(Duration::minutes(55));

		cache.get_or_fetch(&clock, fetch).await.expect("Expired refetch should succeed.");

		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn failed_fetch_leaves_slot_empty() {
		let clock = ManualClock::new(time::macros::datetime!(2025-06-01 12:00 UTC));
		let cache = AppTokenCache::default();
		let result = cache
			.get_or_fetch(&clock, || async {
				Err::<TokenGrant, _>(Error::Api { status: 503, message: "down".into() })
			})
			.await;

		assert!(result.is_err());
		assert!(cache.peek(clock.now()).is_none());
	}

	#[tokio::test]
	async fn concurrent_cold_callers_share_one_fetch() {
		let clock = ManualClock::new(time::macros::datetime!(2025-06-01 12:00 UTC));
		let cache = AppTokenCache::default();
		let calls = AtomicUsize::new(0);
		let counter = &calls;
		let fetch = || async move {
			counter.fetch_add(1, Ordering::SeqCst);
			tokio::time::sleep(std::time::Duration::from_millis(20)).await;

			Ok(grant(3600))
		};
		let (a, b) =
			tokio::join!(cache.get_or_fetch(&clock, fetch), cache.get_or_fetch(&clock, fetch));

		assert_eq!(
			a.expect("First caller should succeed.").value,
			b.expect("Second caller should succeed.").value
		);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn invalidate_clears_slot() {
		let now = time::macros::datetime!(2025-06-01 12:00 UTC);
		let cache = AppTokenCache::default();

		*cache.slot.lock() = Some(AppToken::from_grant(grant(3600), now));

		assert!(cache.peek(now).is_some());

		cache.invalidate();

		assert!(cache.peek(now).is_none());
	}
}
