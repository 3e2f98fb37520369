//! Strongly typed identifiers used across the gateway.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (user, provider).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (user, provider).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (user, provider).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}
impl From<IdentifierError> for Error {
	fn from(e: IdentifierError) -> Self {
		Error::validation(e.to_string())
	}
}

def_id! { UserId, "Identifier of the application user who owns a token pair.", "User" }
def_id! { ProviderId, "Identifier for an OAuth provider descriptor.", "Provider" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn user_ids_validate() {
		assert!(UserId::new(" u1").is_err(), "Leading whitespace must be rejected.");
		assert!(UserId::new("").is_err());

		let user = UserId::new("8c1f0c1e-user").expect("User fixture should be valid.");

		assert_eq!(user.as_ref(), "8c1f0c1e-user");
		assert!(UserId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn serde_enforces_validation() {
		let user: UserId =
			serde_json::from_str("\"u-42\"").expect("User should deserialize successfully.");

		assert_eq!(user.as_ref(), "u-42");
		assert!(serde_json::from_str::<UserId>("\"with space\"").is_err());
	}

	#[test]
	fn identifier_errors_become_validation_errors() {
		let err: Error = UserId::new("").expect_err("Empty ids must fail.").into();

		assert!(matches!(err, Error::Validation { .. }));
		assert_eq!(err.to_string(), "User identifier cannot be empty.");
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<UserId, u8> =
			HashMap::from_iter([(UserId::new("u1").expect("User id should be valid."), 7_u8)]);

		assert_eq!(map.get("u1"), Some(&7));
	}
}
