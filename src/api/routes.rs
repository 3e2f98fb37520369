//! Route handlers.

// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::{Query, State},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	api::{
		ApiError, AppState,
		request::{self, AuthRequest},
	},
	auth::IssuedTokens,
	proxy::{ArtistId, Market, SearchQuery},
};

const TOKEN_TYPE: &str = "Bearer";

/// Bearer token fields returned to the browser. The refresh token is never included.
#[derive(Debug, Serialize)]
pub struct TokenData {
	/// Access token value.
	pub access_token: String,
	/// Always `Bearer`.
	pub token_type: &'static str,
	/// Seconds until the token should be considered expired.
	pub expires_in: i64,
	/// Absolute expiry; only present for user tokens.
	#[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<OffsetDateTime>,
}
impl From<&IssuedTokens> for TokenData {
	fn from(issued: &IssuedTokens) -> Self {
		Self {
			access_token: issued.pair.access_token.expose().to_owned(),
			token_type: TOKEN_TYPE,
			expires_in: issued.expires_in.whole_seconds(),
			expires_at: Some(issued.expires_at),
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
	success: bool,
	token_data: TokenData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
	success: bool,
	connected: bool,
	#[serde(with = "time::serde::rfc3339::option")]
	expires_at: Option<OffsetDateTime>,
}

pub(crate) fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/catalog", get(catalog))
		.route("/auth", post(auth))
		.with_state(state)
}

async fn health() -> impl IntoResponse {
	Json(json!({
		"status": "ok",
		"service": env!("CARGO_PKG_NAME"),
		"version": env!("CARGO_PKG_VERSION"),
	}))
}

async fn catalog(
	State(state): State<AppState>,
	Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
	let param = |name: &str| params.get(name).map(String::as_str);
	let payload = match param("action").map(str::trim).filter(|action| !action.is_empty()) {
		None => return Err(Error::validation("Missing action parameter").into()),
		Some("search") => {
			let query = SearchQuery::parse(param("q"), param("type"), param("limit"))?;

			state.proxy.search(&query).await?
		},
		Some("artist") => {
			let id = ArtistId::parse(param("id"))?;

			state.proxy.artist(&id).await?
		},
		Some("top-tracks") => {
			let id = ArtistId::parse(param("id"))?;
			let market = Market::parse(param("market"))?;

			state.proxy.top_tracks(&id, &market).await?
		},
		Some(other) => return Err(Error::validation(format!("Invalid action: {other}")).into()),
	};

	Ok(Json(payload).into_response())
}

async fn auth(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
	let broker = &state.broker;
	let response = match AuthRequest::from_slice(&body)? {
		AuthRequest::ClientCredentials => {
			let token = broker.client_credentials().await?;
			let token_data = TokenData {
				access_token: token.value.expose().to_owned(),
				token_type: TOKEN_TYPE,
				expires_in: token.remaining_at(broker.clock.now()),
				expires_at: None,
			};

			Json(TokenResponse { success: true, token_data }).into_response()
		},
		AuthRequest::GetAuthUrl { redirect_uri, user_id } => {
			let redirect_uri = request::required(&redirect_uri, "redirectUri")?;
			let user = request::required_user(&user_id)?;
			let url = broker.authorize_url(redirect_uri, &user)?;

			Json(json!({ "authUrl": url.as_str() })).into_response()
		},
		AuthRequest::ExchangeCode { code, redirect_uri, user_id } => {
			let code = request::required(&code, "code")?;
			let redirect_uri = request::required(&redirect_uri, "redirectUri")?;
			let user = request::required_user(&user_id)?;
			let issued = broker.exchange_code(code, redirect_uri, &user).await?;

			Json(TokenResponse { success: true, token_data: (&issued).into() }).into_response()
		},
		AuthRequest::RefreshToken { user_id } => {
			let user = request::required_user(&user_id)?;
			let issued = broker.refresh_user_token(&user).await?;

			Json(TokenResponse { success: true, token_data: (&issued).into() }).into_response()
		},
		AuthRequest::GetStatus { user_id } => {
			let user = request::required_user(&user_id)?;
			let status = broker.connection_status(&user).await?;

			Json(StatusResponse {
				success: true,
				connected: status.connected,
				expires_at: status.expires_at,
			})
			.into_response()
		},
	};

	Ok(response)
}
