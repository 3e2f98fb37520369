//! Validated catalog request parameters.
//!
//! Every constructor returns [`Error::Validation`] with a message that is safe to show the
//! caller verbatim.

// self
use crate::_prelude::*;

/// Longest accepted search string, in characters.
pub const MAX_QUERY_CHARS: usize = 200;
/// Result count used when `limit` is omitted.
pub const DEFAULT_LIMIT: u8 = 20;
/// Market used when `market` is omitted.
pub const DEFAULT_MARKET: &str = "US";

const MAX_ARTIST_ID_LEN: usize = 64;

/// Item kinds the catalog search accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SearchType {
	/// Artists.
	Artist,
	/// Tracks.
	Track,
	/// Albums.
	Album,
	/// Playlists.
	Playlist,
}
impl SearchType {
	/// Wire name used in the `type` parameter.
	pub const fn as_str(self) -> &'static str {
		match self {
			SearchType::Artist => "artist",
			SearchType::Track => "track",
			SearchType::Album => "album",
			SearchType::Playlist => "playlist",
		}
	}
}
impl FromStr for SearchType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"artist" => Ok(SearchType::Artist),
			"track" => Ok(SearchType::Track),
			"album" => Ok(SearchType::Album),
			"playlist" => Ok(SearchType::Playlist),
			other => Err(Error::validation(format!("Invalid search type: {other}"))),
		}
	}
}

/// Validated `search` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
	/// Trimmed search text.
	pub q: String,
	/// Requested item kinds, deduplicated.
	pub types: Vec<SearchType>,
	/// Page size in `1..=50`.
	pub limit: u8,
}
impl SearchQuery {
	/// Validates raw query-string values.
	pub fn parse(q: Option<&str>, types: Option<&str>, limit: Option<&str>) -> Result<Self> {
		let q = q.ok_or_else(|| Error::validation("Search query is required"))?;

		// The limit applies to the raw value, surrounding whitespace included.
		if q.chars().count() > MAX_QUERY_CHARS {
			return Err(Error::validation(format!(
				"Search query must be {MAX_QUERY_CHARS} characters or fewer"
			)));
		}

		let q = Some(q.trim())
			.filter(|q| !q.is_empty())
			.ok_or_else(|| Error::validation("Search query is required"))?;

		let limit = match limit.map(str::trim) {
			None | Some("") => DEFAULT_LIMIT,
			Some(raw) => raw
				.parse::<u8>()
				.ok()
				.filter(|limit| (1..=50).contains(limit))
				.ok_or_else(|| Error::validation("Limit must be an integer between 1 and 50"))?,
		};
		let mut parsed = match types.map(str::trim).filter(|raw| !raw.is_empty()) {
			None => vec![SearchType::Artist],
			Some(raw) => raw.split(',').map(|t| t.trim().parse()).collect::<Result<Vec<_>>>()?,
		};

		parsed.sort();
		parsed.dedup();

		Ok(Self { q: q.to_owned(), types: parsed, limit })
	}

	/// Comma-joined `type` parameter.
	pub fn type_param(&self) -> String {
		self.types.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(",")
	}
}

/// Base62 catalog artist identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtistId(String);
impl ArtistId {
	/// Validates a raw `id` value.
	pub fn parse(raw: Option<&str>) -> Result<Self> {
		let id = raw
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.ok_or_else(|| Error::validation("Artist ID is required"))?;

		if id.len() > MAX_ARTIST_ID_LEN || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
			return Err(Error::validation("Invalid artist ID"));
		}

		Ok(Self(id.to_owned()))
	}
}
impl AsRef<str> for ArtistId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Upper-cased ISO 3166-1 alpha-2 market code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Market(String);
impl Market {
	/// Validates a raw `market` value, defaulting to `US`.
	pub fn parse(raw: Option<&str>) -> Result<Self> {
		let code = match raw.map(str::trim).filter(|code| !code.is_empty()) {
			None => return Ok(Self(DEFAULT_MARKET.into())),
			Some(code) => code,
		};

		if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
			return Err(Error::validation("Market must be a two-letter country code"));
		}

		Ok(Self(code.to_ascii_uppercase()))
	}
}
impl AsRef<str> for Market {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
