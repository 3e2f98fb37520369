// crates.io
use tracing::instrument::Instrumented;
use tracing_subscriber::EnvFilter;
// self
use crate::{_prelude::*, obs::FlowKind};

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "spotify_auth_gateway=info,tower_http=info";

/// A span builder used by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("spotify_auth.flow", flow = kind.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}

/// Installs the global `fmt` subscriber; `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`].
///
/// Returns `false` when a subscriber was already installed.
pub fn init_subscriber() -> bool {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

	tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init().is_ok()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn default_filter_parses() {
		assert!(DEFAULT_LOG_FILTER.parse::<EnvFilter>().is_ok());
	}
}
