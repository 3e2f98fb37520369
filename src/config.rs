//! Process configuration read from the environment.
//!
//! | Variable | Default |
//! | --- | --- |
//! | `HOST`, `PORT` | `0.0.0.0`, `8787` |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000,http://localhost:5173` |
//! | `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET` | unset; token requests fail closed |
//! | `SPOTIFY_ACCOUNTS_URL`, `SPOTIFY_API_URL` | Spotify production hosts |
//! | `SPOTIFY_SCOPES` | `user-read-email user-read-private` |
//! | `SPOTIFY_SHOW_DIALOG` | `false` |
//! | `TOKEN_ENCRYPTION_KEY` | base64 32-byte key; ephemeral when unset and no store path |
//! | `TOKEN_STORE_PATH` | unset selects the in-memory store |

// std
use std::path::PathBuf;
// self
use crate::{
	_prelude::*,
	api::{AppState, OriginAllowList},
	auth::ScopeSet,
	crypto::SecretCipher,
	error::ConfigError,
	flows::{DEFAULT_SCOPES, ReqwestBroker},
	provider::{
		DefaultProviderStrategy, ProviderDescriptor, SPOTIFY_ACCOUNTS_URL, SPOTIFY_API_URL,
	},
	store::{FileStore, MemoryStore, ProfileStore, TokenVault},
};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8787;

/// Fully parsed gateway configuration.
#[derive(Clone, Debug)]
pub struct Config {
	/// Interface to bind.
	pub host: String,
	/// Port to bind.
	pub port: u16,
	/// Browser origins allowed to call the gateway.
	pub allowed_origins: OriginAllowList,
	/// Provider client identifier.
	pub client_id: Option<String>,
	/// Provider client secret.
	pub client_secret: Option<String>,
	/// Provider endpoints.
	pub descriptor: ProviderDescriptor,
	/// Scopes requested on the authorize URL.
	pub scopes: ScopeSet,
	/// Whether the authorize URL forces the consent dialog.
	pub show_dialog: bool,
	/// Key sealing stored tokens.
	pub cipher: Option<SecretCipher>,
	/// Snapshot file for the file-backed store.
	pub token_store_path: Option<PathBuf>,
}
impl Config {
	/// Reads the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads configuration through `lookup`; blank values count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let port: u16 = match var("PORT") {
			Some(raw) => raw.parse().map_err(|e| invalid("PORT", e))?,
			None => DEFAULT_PORT,
		};
		let allowed_origins = match var("ALLOWED_ORIGINS") {
			Some(raw) => OriginAllowList::parse(&raw)?,
			None => OriginAllowList::default(),
		};
		let accounts = parse_url("SPOTIFY_ACCOUNTS_URL", var, SPOTIFY_ACCOUNTS_URL)?;
		let api = parse_url("SPOTIFY_API_URL", var, SPOTIFY_API_URL)?;
		let descriptor =
			ProviderDescriptor::spotify(&accounts, api).map_err(|e| invalid("SPOTIFY_API_URL", e))?;
		let scopes: ScopeSet = var("SPOTIFY_SCOPES")
			.as_deref()
			.unwrap_or(DEFAULT_SCOPES)
			.parse()
			.map_err(|e| invalid("SPOTIFY_SCOPES", e))?;
		let show_dialog = match var("SPOTIFY_SHOW_DIALOG") {
			Some(raw) => parse_bool("SPOTIFY_SHOW_DIALOG", &raw)?,
			None => false,
		};
		let cipher = var("TOKEN_ENCRYPTION_KEY")
			.map(|key| SecretCipher::from_base64(&key))
			.transpose()
			.map_err(|e| invalid("TOKEN_ENCRYPTION_KEY", e))?;
		let token_store_path = var("TOKEN_STORE_PATH").map(PathBuf::from);

		if token_store_path.is_some() && cipher.is_none() {
			return Err(ConfigError::InvalidEnv {
				name: "TOKEN_ENCRYPTION_KEY",
				reason: "required when TOKEN_STORE_PATH is set".into(),
			});
		}

		Ok(Self {
			host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
			port,
			allowed_origins,
			client_id: var("SPOTIFY_CLIENT_ID"),
			client_secret: var("SPOTIFY_CLIENT_SECRET"),
			descriptor,
			scopes,
			show_dialog,
			cipher,
			token_store_path,
		})
	}

	/// `host:port` string suitable for binding a listener.
	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	/// Opens the configured vault and profile table.
	pub fn build_stores(&self) -> Result<(Arc<dyn TokenVault>, Arc<dyn ProfileStore>)> {
		let cipher = match &self.cipher {
			Some(cipher) => cipher.clone(),
			None => {
				tracing::warn!(
					"TOKEN_ENCRYPTION_KEY is unset; sealing tokens with an ephemeral key"
				);

				SecretCipher::generate()
			},
		};

		let stores: (Arc<dyn TokenVault>, Arc<dyn ProfileStore>) = match &self.token_store_path {
			Some(path) => {
				let store = Arc::new(FileStore::open(path, cipher)?);

				tracing::info!(path = %path.display(), "using file token store");

				(store.clone() as Arc<dyn TokenVault>, store as Arc<dyn ProfileStore>)
			},
			None => {
				let store = Arc::new(MemoryStore::new(cipher));

				tracing::info!("using in-memory token store");

				(store.clone() as Arc<dyn TokenVault>, store as Arc<dyn ProfileStore>)
			},
		};

		Ok(stores)
	}

	/// Builds the broker with the configured credentials, scopes, and stores.
	pub fn build_broker(&self) -> Result<ReqwestBroker> {
		let (vault, profiles) = self.build_stores()?;
		let mut broker = ReqwestBroker::new(
			vault,
			profiles,
			self.descriptor.clone(),
			Arc::new(DefaultProviderStrategy),
		)?
		.with_scopes(self.scopes.clone())
		.with_show_dialog(self.show_dialog);

		match (&self.client_id, &self.client_secret) {
			(Some(id), Some(secret)) => broker = broker.with_credentials(id, secret),
			(id, _) => {
				broker = broker.with_credentials(id.clone().unwrap_or_default(), "");

				tracing::warn!(
					"Spotify client credentials are incomplete; token requests will fail"
				);
			},
		}

		Ok(broker)
	}

	/// Builds the router state: broker, catalog proxy, and origin allow-list.
	pub fn build_state(&self) -> Result<AppState> {
		Ok(AppState::new(Arc::new(self.build_broker()?), self.allowed_origins.clone()))
	}
}

fn invalid(name: &'static str, reason: impl Display) -> ConfigError {
	ConfigError::InvalidEnv { name, reason: reason.to_string() }
}

fn parse_url<F>(name: &'static str, var: F, default: &str) -> Result<Url, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	Url::parse(var(name).as_deref().unwrap_or(default)).map_err(|e| invalid(name, e))
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
	match raw.to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" => Ok(true),
		"false" | "0" | "no" => Ok(false),
		other => Err(invalid(name, format!("expected true or false, got `{other}`"))),
	}
}
