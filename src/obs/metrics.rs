// self
use crate::obs::{DeliveryOutcome, Stage, StageOutcome};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(stage: Stage, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"fcm_relay_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

/// Records one recipient's delivery outcome (when enabled).
pub fn record_delivery_outcome(outcome: DeliveryOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("fcm_relay_dispatch_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
