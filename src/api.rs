//! HTTP surface of the gateway.
//!
//! Routes:
//! - `GET /catalog?action=search|artist|top-tracks`: read-only catalog proxy
//! - `POST /auth` with `{ "action": ... }`: token flows
//! - `GET /health`: liveness check
//!
//! Every request passes the origin guard before it reaches a handler, and every failure leaves
//! through [`ApiError`] as `{ "error": string }`.

pub mod error;
pub mod origin;
pub mod request;
pub mod routes;

pub use error::*;
pub use origin::*;

// crates.io
use axum::{Router, middleware};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
// self
use crate::{_prelude::*, flows::ReqwestBroker, proxy::CatalogProxy};

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Token broker serving the `/auth` actions.
	pub broker: Arc<ReqwestBroker>,
	/// Catalog proxy serving `/catalog`.
	pub proxy: Arc<CatalogProxy>,
	/// Origins allowed to call the gateway.
	pub origins: Arc<OriginAllowList>,
}
impl AppState {
	/// Wires a broker and an allow-list; the proxy gets its own app-token cache.
	pub fn new(broker: Arc<ReqwestBroker>, origins: OriginAllowList) -> Self {
		let proxy = Arc::new(CatalogProxy::new(broker.clone()));

		Self { broker, proxy, origins: Arc::new(origins) }
	}
}

/// Builds the full router with the origin guard, CORS, and request tracing applied.
pub fn router(state: AppState) -> Router {
	let cors = state.origins.cors_layer();
	let origins = state.origins.clone();

	routes::router(state)
		.layer(middleware::from_fn_with_state(origins, guard_origin))
		.layer(cors)
		.layer(TraceLayer::new_for_http())
}

/// Serves `router` on `listener` until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
	if let Ok(addr) = listener.local_addr() {
		tracing::info!(%addr, "listening");
	}

	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
	let ctrl_c = async {
		match signal::ctrl_c().await {
			Ok(()) => tracing::info!("received Ctrl-C, shutting down"),
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for Ctrl-C");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
				tracing::info!("received SIGTERM, shutting down");
			},
			Err(e) => {
				tracing::error!(error = %e, "failed to install SIGTERM handler");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
