// crates.io
use tracing::{Instrument, instrument::Instrumented};
// self
use crate::{
	_prelude::*,
	obs::{self, Stage, StageOutcome},
};

/// A span builder used by pipeline stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	stage: Stage,
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage and records the attempt.
	pub fn new(stage: Stage) -> Self {
		let span = tracing::info_span!("fcm_relay.stage", stage = stage.as_str());

		obs::record_stage_outcome(stage, StageOutcome::Attempt);

		Self { stage, span }
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> StageSpanGuard {
		StageSpanGuard { guard: self.span.entered() }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}

	/// Records the stage's final outcome from a result and hands the result back.
	pub fn finish<T, E>(&self, result: Result<T, E>) -> Result<T, E>
	where
		E: Display,
	{
		match &result {
			Ok(_) => obs::record_stage_outcome(self.stage, StageOutcome::Success),
			Err(e) => {
				obs::record_stage_outcome(self.stage, StageOutcome::Failure);

				self.span.in_scope(|| tracing::warn!(error = %e, "Stage failed."));
			},
		}

		result
	}
}

/// RAII guard returned by [`StageSpan::entered`].
pub struct StageSpanGuard {
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for StageSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("StageSpanGuard(..)")
	}
}
