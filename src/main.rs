//! Gateway binary: loads `.env`, configures tracing, and serves the router.

// crates.io
use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
// self
use spotify_auth_gateway::{api, config::Config, obs};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let dotenv = dotenvy::dotenv().ok();

	obs::init_subscriber();

	if let Some(path) = dotenv {
		tracing::debug!(path = %path.display(), "loaded environment file");
	}

	let config = Config::from_env().wrap_err("failed to load configuration")?;
	let state = config.build_state().wrap_err("failed to build gateway state")?;
	let listener = TcpListener::bind(config.bind_address())
		.await
		.wrap_err_with(|| format!("failed to bind {}", config.bind_address()))?;

	tracing::info!(
		version = env!("CARGO_PKG_VERSION"),
		origins = config.allowed_origins.origins().len(),
		credentials = state.broker.has_credentials(),
		"starting spotify auth gateway"
	);

	api::serve(listener, api::router(state)).await.wrap_err("server terminated with an error")
}
