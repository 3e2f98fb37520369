//! Spotify OAuth 2.0 gateway: a cached app token for catalog calls, authorization-code exchange
//! and refresh with sealed token storage, and an origin-guarded HTTP router in front of both.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod proxy;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		clock::{Clock, ManualClock},
		crypto::SecretCipher,
		flows::{Broker, ReqwestBroker},
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
		store::{MemoryStore, ProfileStore, TokenVault},
	};

	/// Client identifier shared by the integration fixtures.
	pub const TEST_CLIENT_ID: &str = "client-fixture";
	/// Client secret shared by the integration fixtures.
	pub const TEST_CLIENT_SECRET: &str = "secret-fixture";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Points every provider endpoint at a mock server base URL.
	pub fn test_descriptor(base_url: &str) -> ProviderDescriptor {
		let base = base_url.trim_end_matches('/');

		ProviderDescriptor::builder(
			crate::auth::ProviderId::new("spotify-mock")
				.expect("Mock provider identifier should be valid."),
		)
		.authorization_endpoint(
			Url::parse(&format!("{base}/authorize"))
				.expect("Mock authorization endpoint should parse."),
		)
		.token_endpoint(
			Url::parse(&format!("{base}/api/token")).expect("Mock token endpoint should parse."),
		)
		.api_base(Url::parse(&format!("{base}/v1")).expect("Mock API base should parse."))
		.build()
		.expect("Mock provider descriptor should build.")
	}

	/// Test fixture bundling a broker with the stores and clock it was built from.
	pub struct TestBroker {
		/// Broker wired to the reqwest transport.
		pub broker: ReqwestBroker,
		/// Store backing both the vault and the profile table.
		pub store: Arc<MemoryStore>,
		/// Manually advanced clock shared with the broker.
		pub clock: Arc<ManualClock>,
	}

	/// Constructs a [`Broker`] backed by an in-memory store, manual clock, default provider
	/// strategy, and the reqwest transport used across integration tests.
	pub fn build_reqwest_test_broker(descriptor: ProviderDescriptor) -> TestBroker {
		let store = Arc::new(MemoryStore::new(SecretCipher::generate()));
		let vault: Arc<dyn TokenVault> = store.clone();
		let profiles: Arc<dyn ProfileStore> = store.clone();
		let clock = Arc::new(ManualClock::new(time::macros::datetime!(2025-06-01 12:00 UTC)));
		let shared_clock: Arc<dyn Clock> = clock.clone();
		let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
		let broker = Broker::with_http_client(
			vault,
			profiles,
			descriptor,
			strategy,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_credentials(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
		.with_clock(shared_clock);

		TestBroker { broker, store, clock }
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
use {color_eyre as _, dotenvy as _};
#[cfg(test)] use {httpmock as _, tower as _};
