// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a span for one outbound call.
	///
	/// `stage` names the operation (an HTTP method or the grant type) and `target` the host the
	/// call goes to.
	pub fn new(kind: CallKind, stage: &str, target: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"microservices_client.call",
				call = kind.as_str(),
				stage,
				target,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage, target);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning for a silently tolerated problem.
pub fn warn_degraded(kind: CallKind, reason: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(call = kind.as_str(), %reason, "call degraded");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, reason);
	}
}
