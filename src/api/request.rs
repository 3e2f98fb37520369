//! `POST /auth` body decoding.
//!
//! The body is decoded in two passes: first as a JSON object so a missing or unknown `action`
//! gets its own message, then the action's fields through `serde_path_to_error` so type
//! mismatches name the offending field.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{_prelude::*, auth::UserId};

/// Decoded `POST /auth` body. Blank strings count as missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthRequest {
	/// App-only token.
	ClientCredentials,
	/// Authorize URL for a user.
	GetAuthUrl {
		/// Callback URL registered with the provider.
		redirect_uri: Option<String>,
		/// Account starting the flow.
		user_id: Option<String>,
	},
	/// Authorization-code exchange.
	ExchangeCode {
		/// Code from the provider callback.
		code: Option<String>,
		/// Callback URL used on the authorize URL.
		redirect_uri: Option<String>,
		/// Account completing the flow.
		user_id: Option<String>,
	},
	/// Refresh of a stored user token.
	RefreshToken {
		/// Account whose token is refreshed.
		user_id: Option<String>,
	},
	/// Connection state lookup.
	GetStatus {
		/// Account to inspect.
		user_id: Option<String>,
	},
}
impl AuthRequest {
	/// Decodes a raw request body.
	pub fn from_slice(body: &[u8]) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_slice(body);
		let value: Value = serde_path_to_error::deserialize(&mut de).map_err(invalid_body)?;

		de.end().map_err(|e| Error::validation(format!("Invalid request body: {e}")))?;

		let action = match value.get("action") {
			None | Some(Value::Null) => return Err(Error::validation("Missing action parameter")),
			Some(Value::String(action)) if action.trim().is_empty() =>
				return Err(Error::validation("Missing action parameter")),
			Some(Value::String(action)) => action,
			Some(other) => return Err(Error::validation(format!("Invalid action: {other}"))),
		};

		let request = match action.as_str() {
			"client_credentials" => Self::ClientCredentials,
			"get_auth_url" => {
				let UserRedirect { redirect_uri, user_id } = fields(&value)?;

				Self::GetAuthUrl { redirect_uri, user_id }
			},
			"exchange_code" => {
				let CodeExchange { code, redirect_uri, user_id } = fields(&value)?;

				Self::ExchangeCode { code, redirect_uri, user_id }
			},
			"refresh_token" => Self::RefreshToken { user_id: fields::<UserOnly>(&value)?.user_id },
			"get_status" => Self::GetStatus { user_id: fields::<UserOnly>(&value)?.user_id },
			_ => return Err(Error::validation(format!("Invalid action: {action}"))),
		};

		Ok(request)
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRedirect {
	redirect_uri: Option<String>,
	user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeExchange {
	code: Option<String>,
	redirect_uri: Option<String>,
	user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserOnly {
	user_id: Option<String>,
}

/// Returns the trimmed value of a required string field.
pub fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
	field
		.as_deref()
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.ok_or_else(|| Error::missing_parameter(name))
}

/// Returns the validated `userId` field.
pub fn required_user(field: &Option<String>) -> Result<UserId> {
	Ok(UserId::new(required(field, "userId")?)?)
}

fn fields<T>(value: &Value) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(invalid_body)
}

fn invalid_body<E>(e: serde_path_to_error::Error<E>) -> Error
where
	E: Display,
{
	Error::validation(format!("Invalid request body: {e}"))
}
