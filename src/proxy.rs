//! Read-only catalog proxy authenticated with an app-only token.
//!
//! The proxy keeps its own [`AppTokenCache`], separate from the broker's, and mints tokens
//! through [`Broker::request_client_credentials`](crate::flows::Broker). A `401` from the API
//! drops the cached token so the next call refetches; the failing call is not retried.

pub mod query;

pub use query::*;

// crates.io
use reqwest::{StatusCode, header::AUTHORIZATION};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransientError, TransportError},
	flows::{AppTokenCache, ReqwestBroker},
	obs::{self, FlowKind},
};

const MAX_ERROR_BODY_CHARS: usize = 256;

/// Forwards validated catalog lookups to the provider API.
#[derive(Debug)]
pub struct CatalogProxy {
	broker: Arc<ReqwestBroker>,
	cache: AppTokenCache,
}
impl CatalogProxy {
	/// Creates a proxy that borrows transport, descriptor, and credentials from `broker`.
	pub fn new(broker: Arc<ReqwestBroker>) -> Self {
		Self { broker, cache: AppTokenCache::default() }
	}

	/// `GET /search`.
	pub async fn search(&self, query: &SearchQuery) -> Result<Value> {
		let limit = query.limit.to_string();
		let type_param = query.type_param();

		self.get(
			"search",
			&["search"],
			&[("q", query.q.as_str()), ("type", type_param.as_str()), ("limit", limit.as_str())],
		)
		.await
	}

	/// `GET /artists/{id}`.
	pub async fn artist(&self, id: &ArtistId) -> Result<Value> {
		self.get("artist", &["artists", id.as_ref()], &[]).await
	}

	/// `GET /artists/{id}/top-tracks?market=XX`.
	pub async fn top_tracks(&self, id: &ArtistId, market: &Market) -> Result<Value> {
		self.get("top_tracks", &["artists", id.as_ref(), "top-tracks"], &[(
			"market",
			market.as_ref(),
		)])
		.await
	}

	async fn get(
		&self,
		stage: &'static str,
		segments: &[&str],
		params: &[(&str, &str)],
	) -> Result<Value> {
		obs::observe(FlowKind::Catalog, stage, async move {
			let url = self.endpoint(segments, params)?;
			let broker = &self.broker;
			let token = self
				.cache
				.get_or_fetch(broker.clock.as_ref(), || broker.request_client_credentials())
				.await?;
			let response = self
				.broker
				.http_client
				.get(url)
				.header(AUTHORIZATION, format!("Bearer {}", token.value.expose()))
				.send()
				.await
				.map_err(TransportError::network)?;
			let status = response.status();
			let body = response.text().await.map_err(TransportError::network)?;

			if !status.is_success() {
				if status == StatusCode::UNAUTHORIZED {
					tracing::warn!("catalog API rejected the app token; invalidating cache");

					self.cache.invalidate();
				}

				return Err(Error::Api {
					status: status.as_u16(),
					message: truncate(&body, MAX_ERROR_BODY_CHARS),
				});
			}

			serde_json::from_str(&body)
				.map_err(|source| Error::from(TransientError::ApiResponseParse { source }))
		})
		.await
	}

	fn endpoint(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url> {
		let mut url = self.broker.descriptor.endpoints.api.clone();

		if url.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { url: url.into() }.into());
		}
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		if !params.is_empty() {
			url.query_pairs_mut().extend_pairs(params);
		}

		Ok(url)
	}
}

fn truncate(body: &str, max: usize) -> String {
	match body.char_indices().nth(max) {
		Some((idx, _)) => format!("{}…", &body[..idx]),
		None => body.to_owned(),
	}
}
