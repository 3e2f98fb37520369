//! Authorization scope sets requested from the provider.

// std
use std::collections::BTreeSet;
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Deduplicated, sorted set of provider scopes (e.g. `user-read-email`).
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet(Arc<[String]>);
impl ScopeSet {
	/// Creates a normalized scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
			}

			set.insert(owned);
		}

		Ok(Self(Arc::from(set.into_iter().collect::<Vec<_>>())))
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Iterator over normalized scopes.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Space-delimited representation sent in the `scope` query parameter.
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.0).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	/// Accepts space- or comma-delimited lists.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}

		let parts = s.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty());
		let set = Self::new(parts)?;

		if set.is_empty() { Err(ScopeValidationError::Empty) } else { Ok(set) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_normalize_and_dedupe() {
		let lhs = ScopeSet::new(["user-read-private", "user-read-email", "user-read-email"])
			.expect("Left-hand scope set should be valid.");
		let rhs = ScopeSet::new(["user-read-email", "user-read-private"])
			.expect("Right-hand scope set should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.normalized(), "user-read-email user-read-private");
	}

	#[test]
	fn from_str_accepts_commas_and_spaces() {
		let scopes = ScopeSet::from_str("user-top-read, user-read-email  user-follow-read")
			.expect("Mixed delimiters should parse.");

		assert!(scopes.contains("user-top-read"));
		assert_eq!(scopes.iter().count(), 3);
		assert!(ScopeSet::from_str("").expect("Empty input is an empty set.").is_empty());
		assert!(ScopeSet::from_str(" , ").is_err(), "Delimiter-only input must be rejected.");
	}

	#[test]
	fn invalid_scopes_error() {
		assert!(ScopeSet::new([""]).is_err());
		assert!(matches!(
			ScopeSet::new(["contains space"]),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
	}
}
