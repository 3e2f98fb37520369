// self
use crate::_prelude::*;

/// OAuth 2.0 grant types the gateway issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant completing a user's consent.
	AuthorizationCode,
	/// Refresh Token grant for long-lived user sessions.
	RefreshToken,
	/// Client Credentials grant for app-only tokens.
	ClientCredentials,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
			GrantType::ClientCredentials => "client_credentials",
		}
	}

	/// Returns true for grants that act on behalf of a specific user.
	pub fn is_user_scoped(self) -> bool {
		matches!(self, GrantType::AuthorizationCode | GrantType::RefreshToken)
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
