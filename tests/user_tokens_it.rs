#![cfg(feature = "test")]

// crates.io
use httpmock::prelude::*;
// self
use spotify_auth_gateway::{
	_preludet::*,
	auth::{TokenPair, TokenSecret, UserId},
	clock::Clock,
	crypto::SecretCipher,
	error::ConfigError,
	flows::{Broker, ReqwestBroker},
	oauth::ReqwestTransportErrorMapper,
	provider::{DefaultProviderStrategy, GrantType},
	store::{MemoryStore, ProfileStore, StoreError, StoreFuture, TokenVault},
};

const REDIRECT_URI: &str = "https://app/callback";

struct UnwritableVault;
impl TokenVault for UnwritableVault {
	fn store<'a>(&'a self, _: &'a UserId, _: TokenPair) -> StoreFuture<'a, ()> {
		Box::pin(async { Err(StoreError::Backend { message: "disk full".into() }) })
	}

	fn retrieve<'a>(&'a self, _: &'a UserId) -> StoreFuture<'a, Option<TokenPair>> {
		Box::pin(async { Ok(None) })
	}
}

fn user(id: &str) -> UserId {
	UserId::new(id).expect("User fixture should be valid.")
}

#[tokio::test]
async fn exchange_then_refresh_advances_expiry_and_keeps_refresh_token() {
	let server = MockServer::start_async().await;
	let fixture = build_reqwest_test_broker(test_descriptor(&server.base_url()));
	let u1 = user("u1");
	let exchange = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "code-1")
				.form_urlencoded_tuple("redirect_uri", REDIRECT_URI);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-1\",\"refresh_token\":\"refresh-1\",\
				 \"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let issued = fixture
		.broker
		.exchange_code("code-1", REDIRECT_URI, &u1)
		.await
		.expect("Code exchange should succeed.");

	exchange.assert_async().await;

	let first_expiry = issued.expires_at;
	let profile = fixture
		.store
		.fetch(&u1)
		.await
		.expect("Profile fetch should succeed.")
		.expect("Profile should exist after the exchange.");

	assert!(profile.connected);
	assert_eq!(profile.access_token_expires_at, Some(first_expiry));
	assert_eq!(first_expiry, fixture.clock.now() + Duration::hours(1));

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "refresh-1");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-2\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;

	fixture.clock.advance(Duration::minutes(50));

	let refreshed =
		fixture.broker.refresh_user_token(&u1).await.expect("Refresh should succeed.");

	refresh.assert_async().await;

	assert!(refreshed.expires_at > first_expiry);
	assert_eq!(refreshed.pair.access_token.expose(), "access-2");
	assert_eq!(refreshed.pair.refresh_token.expose(), "refresh-1");
	assert_eq!(
		fixture.store.retrieve(&u1).await.expect("Vault read should succeed."),
		Some(TokenPair {
			access_token: TokenSecret::new("access-2"),
			refresh_token: TokenSecret::new("refresh-1"),
		})
	);
	assert_eq!(
		fixture
			.broker
			.connection_status(&u1)
			.await
			.expect("Status lookup should succeed.")
			.expires_at,
		Some(refreshed.expires_at)
	);
}

#[tokio::test]
async fn rotated_refresh_token_replaces_the_stored_one() {
	let server = MockServer::start_async().await;
	let fixture = build_reqwest_test_broker(test_descriptor(&server.base_url()));
	let u2 = user("u2");

	fixture
		.store
		.store(&u2, TokenPair {
			access_token: TokenSecret::new("access-old"),
			refresh_token: TokenSecret::new("refresh-old"),
		})
		.await
		.expect("Seeding the vault should succeed.");
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.form_urlencoded_tuple("refresh_token", "refresh-old");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\
				 \"token_type\":\"bearer\",\"expires_in\":1800}",
			);
		})
		.await;

	fixture.broker.refresh_user_token(&u2).await.expect("Refresh should succeed.");

	let stored = fixture
		.store
		.retrieve(&u2)
		.await
		.expect("Vault read should succeed.")
		.expect("Pair should remain on file.");

	assert_eq!(stored.refresh_token.expose(), "refresh-new");
}

#[tokio::test]
async fn refresh_without_stored_tokens_is_not_connected() {
	let server = MockServer::start_async().await;
	let fixture = build_reqwest_test_broker(test_descriptor(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(500);
		})
		.await;
	let err = fixture
		.broker
		.refresh_user_token(&user("ghost"))
		.await
		.expect_err("Unknown users must not refresh.");

	assert!(matches!(err, Error::NotConnected));
	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn revoked_refresh_token_is_an_upstream_rejection() {
	let server = MockServer::start_async().await;
	let fixture = build_reqwest_test_broker(test_descriptor(&server.base_url()));
	let u3 = user("u3");

	fixture
		.store
		.store(&u3, TokenPair {
			access_token: TokenSecret::new("access-3"),
			refresh_token: TokenSecret::new("refresh-revoked"),
		})
		.await
		.expect("Seeding the vault should succeed.");
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Token revoked\"}");
		})
		.await;

	let err = fixture
		.broker
		.refresh_user_token(&u3)
		.await
		.expect_err("Revoked refresh tokens must fail.");

	assert!(matches!(err, Error::UpstreamAuth { grant: GrantType::RefreshToken, .. }));
	assert_eq!(
		fixture.store.retrieve(&u3).await.expect("Vault read should succeed.").map(|pair| {
			pair.refresh_token.expose().to_owned()
		}),
		Some("refresh-revoked".to_owned())
	);
}

#[tokio::test]
async fn rejected_code_leaves_the_user_disconnected() {
	let server = MockServer::start_async().await;
	let fixture = build_reqwest_test_broker(test_descriptor(&server.base_url()));
	let u4 = user("u4");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Invalid code\"}");
		})
		.await;

	let err = fixture
		.broker
		.exchange_code("stale", REDIRECT_URI, &u4)
		.await
		.expect_err("Rejected codes must fail.");

	assert!(matches!(
		err,
		Error::UpstreamAuth { grant: GrantType::AuthorizationCode, status: Some(400), .. }
	));
	assert!(fixture.store.retrieve(&u4).await.expect("Vault read should succeed.").is_none());
	assert!(
		!fixture.broker.connection_status(&u4).await.expect("Status should succeed.").connected
	);
}

#[tokio::test]
async fn exchange_without_refresh_token_is_rejected() {
	let server = MockServer::start_async().await;
	let fixture = build_reqwest_test_broker(test_descriptor(&server.base_url()));
	let u5 = user("u5");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-5\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;

	let err = fixture
		.broker
		.exchange_code("code-5", REDIRECT_URI, &u5)
		.await
		.expect_err("A grant without a refresh token cannot connect a user.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));
	assert!(fixture.store.fetch(&u5).await.expect("Profile fetch should succeed.").is_none());
}

#[tokio::test]
async fn vault_failure_stops_the_exchange_before_the_profile_write() {
	let server = MockServer::start_async().await;
	let profiles = Arc::new(MemoryStore::new(SecretCipher::generate()));
	let broker: ReqwestBroker = Broker::with_http_client(
		Arc::new(UnwritableVault),
		profiles.clone(),
		test_descriptor(&server.base_url()),
		Arc::new(DefaultProviderStrategy),
		test_reqwest_http_client(),
		Arc::new(ReqwestTransportErrorMapper),
	)
	.with_credentials(TEST_CLIENT_ID, TEST_CLIENT_SECRET);
	let u6 = user("u6");
	let exchange = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-6\",\"refresh_token\":\"refresh-6\",\
				 \"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let err = broker
		.exchange_code("code-6", REDIRECT_URI, &u6)
		.await
		.expect_err("A failed vault write must fail the exchange.");

	exchange.assert_async().await;

	assert!(matches!(err, Error::Storage(StoreError::Backend { .. })));
	assert!(profiles.fetch(&u6).await.expect("Profile fetch should succeed.").is_none());
	assert!(!broker.connection_status(&u6).await.expect("Status should succeed.").connected);
}
