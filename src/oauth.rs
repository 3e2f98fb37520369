//! Internal OAuth client facade over the `oauth2` crate.
//!
//! Every token request goes through [`BasicFacade`], which wires the descriptor's endpoints and
//! client authentication into an `oauth2` [`BasicClient`], executes the request on a
//! [`TokenHttpClient`], and maps failures into gateway [`Error`] values via the
//! [`ProviderStrategy`].

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	error::{ConfigError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{
		ClientAuthMethod, GrantType, ProviderDescriptor, ProviderErrorContext, ProviderStrategy,
	},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into gateway [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a gateway error.
	fn map_transport_error(
		&self,
		grant: GrantType,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		grant: GrantType,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(grant, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransientError::TokenEndpoint {
				message: format!("HTTP client error during {grant} request: {message}"),
				status: meta_status(meta),
			}
			.into(),
			_ => TransientError::TokenEndpoint {
				message: format!("HTTP client error during {grant} request"),
				status: meta_status(meta),
			}
			.into(),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_client_credentials<'a, 'strategy>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'strategy: 'a;

	fn exchange_authorization_code<'a, 'strategy, 'code, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		redirect_uri: &'redirect str,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'strategy: 'a,
		'code: 'a,
		'redirect: 'a;

	fn refresh_token<'a, 'strategy, 'refresh>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		refresh_token: &'refresh str,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'strategy: 'a,
		'refresh: 'a;
}

pub(crate) struct BasicFacade<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let auth_type = match descriptor.client_auth {
			ClientAuthMethod::ClientSecretBasic => AuthType::BasicAuth,
			ClientAuthMethod::ClientSecretPost => AuthType::RequestBody,
		};
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_auth_type(auth_type);

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	fn map_error(
		&self,
		strategy: &dyn ProviderStrategy,
		grant: GrantType,
		meta: Option<ResponseMetadata>,
		err: BasicRequestTokenError<HttpClientError<C::TransportError>>,
	) -> Error {
		map_request_error(strategy, grant, meta.as_ref(), err, self.error_mapper.as_ref())
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_client_credentials<'a, 'strategy>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'strategy: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let response = self
				.oauth_client
				.exchange_client_credentials()
				.request_async(&instrumented)
				.await
				.map_err(|err| {
					self.map_error(strategy, GrantType::ClientCredentials, meta.take(), err)
				})?;

			into_grant(response)
		})
	}

	fn exchange_authorization_code<'a, 'strategy, 'code, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		redirect_uri: &'redirect str,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'strategy: 'a,
		'code: 'a,
		'redirect: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			// `RedirectUrl` keeps the caller's string, so the provider sees it byte-for-byte.
			let redirect_url = RedirectUrl::new(redirect_uri.to_owned())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_redirect_uri(Cow::Owned(redirect_url))
				.request_async(&instrumented)
				.await
				.map_err(|err| {
					self.map_error(strategy, GrantType::AuthorizationCode, meta.take(), err)
				})?;

			into_grant(response)
		})
	}

	fn refresh_token<'a, 'strategy, 'refresh>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		refresh_token: &'refresh str,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'strategy: 'a,
		'refresh: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| {
					self.map_error(strategy, GrantType::RefreshToken, meta.take(), err)
				})?;

			into_grant(response)
		})
	}
}

fn into_grant(response: BasicTokenResponse) -> Result<TokenGrant> {
	let grant = TokenGrant::new(
		response.access_token().secret().to_owned(),
		response.refresh_token().map(|token| token.secret().to_owned()),
		response.expires_in(),
	)?;

	Ok(grant)
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<&ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let status = meta_status(meta);

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, grant, response, status),
		RequestTokenError::Request(error) => mapper.map_transport_error(grant, meta, error),
		RequestTokenError::Parse(source, body) => match status {
			// Non-2xx with a body that is not an OAuth error document.
			Some(code) if code >= 400 => {
				let ctx = ProviderErrorContext::new(grant)
					.with_http_status(code)
					.with_body_preview(String::from_utf8_lossy(&body));
				let message = status_message(code, ctx.body_preview.as_deref());

				classify(strategy, ctx, message)
			},
			_ => TransientError::TokenResponseParse { source, status }.into(),
		},
		RequestTokenError::Other(message) => match status {
			Some(code) if code >= 400 => classify(
				strategy,
				ProviderErrorContext::new(grant).with_http_status(code),
				format!("Token endpoint returned HTTP {code}: {message}"),
			),
			_ => TransientError::TokenEndpoint {
				message: format!("Token endpoint returned an unexpected response: {message}"),
				status,
			}
			.into(),
		},
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	response: BasicErrorResponse,
	status: Option<u16>,
) -> Error {
	let mut ctx =
		ProviderErrorContext::new(grant).with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(code) = status {
		ctx = ctx.with_http_status(code);
	}

	let message = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_string(),
	};

	classify(strategy, ctx, message)
}

fn status_message(code: u16, body: Option<&str>) -> String {
	match body.map(str::trim).filter(|body| !body.is_empty()) {
		Some(body) => format!("Token endpoint returned HTTP {code}: {body}"),
		None => format!("Token endpoint returned HTTP {code}"),
	}
}

fn classify(strategy: &dyn ProviderStrategy, ctx: ProviderErrorContext, message: String) -> Error {
	let kind = strategy.classify_token_error(&ctx);

	if kind.is_rejection() {
		Error::UpstreamAuth { grant: ctx.grant_type, reason: message, status: ctx.http_status }
	} else {
		TransientError::TokenEndpoint { message, status: ctx.http_status }.into()
	}
}

fn map_reqwest_error(
	grant: GrantType,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: format!("Request timed out during {grant} request"),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ProviderId, provider::DefaultProviderStrategy};

	fn descriptor(method: ClientAuthMethod) -> ProviderDescriptor {
		ProviderDescriptor::builder(
			ProviderId::new("spotify").expect("Provider id fixture should be valid."),
		)
		.authorization_endpoint(
			Url::parse("https://accounts.example/authorize").expect("URL fixture should parse."),
		)
		.token_endpoint(
			Url::parse("https://accounts.example/api/token").expect("URL fixture should parse."),
		)
		.api_base(Url::parse("https://api.example/v1").expect("URL fixture should parse."))
		.client_auth(method)
		.build()
		.expect("Descriptor fixture should build.")
	}

	#[test]
	fn builds_for_both_client_auth_methods() {
		for method in [ClientAuthMethod::ClientSecretBasic, ClientAuthMethod::ClientSecretPost] {
			let facade = <BasicFacade>::from_descriptor(
				&descriptor(method),
				"client-id",
				"secret",
				Arc::new(ReqwestHttpClient::default()),
				Arc::new(ReqwestTransportErrorMapper),
			);

			assert!(facade.is_ok());
		}
	}

	#[test]
	fn server_rejections_become_upstream_auth_errors() {
		let response: BasicErrorResponse = serde_json::from_str(
			r#"{"error":"invalid_grant","error_description":"Invalid authorization code"}"#,
		)
		.expect("Error fixture should deserialize.");
		let err = map_server_response_error(
			&DefaultProviderStrategy,
			GrantType::AuthorizationCode,
			response,
			Some(400),
		);

		assert!(matches!(
			err,
			Error::UpstreamAuth { grant: GrantType::AuthorizationCode, status: Some(400), .. }
		));
	}

	#[test]
	fn status_messages_carry_the_body_preview() {
		assert_eq!(
			status_message(503, Some(" upstream unavailable\n")),
			"Token endpoint returned HTTP 503: upstream unavailable"
		);
		assert_eq!(status_message(502, Some("  ")), "Token endpoint returned HTTP 502");
		assert_eq!(status_message(500, None), "Token endpoint returned HTTP 500");
	}

	#[test]
	fn server_errors_stay_transient() {
		let response: BasicErrorResponse = serde_json::from_str(r#"{"error":"server_error"}"#)
			.expect("Error fixture should deserialize.");
		let err = map_server_response_error(
			&DefaultProviderStrategy,
			GrantType::ClientCredentials,
			response,
			Some(503),
		);

		assert!(matches!(err, Error::Transient(TransientError::TokenEndpoint { .. })));
	}
}
