//! Observability helpers for the relay pipeline.
//!
//! Every stage runs inside a `tracing` span named `fcm_relay.stage` carrying a `stage` field.
//!
//! # Feature Flags
//!
//! - Enable `metrics` to increment `fcm_relay_stage_total` for every stage attempt, success, and
//!   failure (labeled by `stage` + `outcome`) and `fcm_relay_dispatch_total` for every recipient
//!   (labeled by `outcome`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline stages observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Assertion signing.
	Sign,
	/// Assertion to access-token exchange.
	Exchange,
	/// Per-recipient fan-out.
	Dispatch,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Sign => "sign",
			Stage::Exchange => "exchange",
			Stage::Dispatch => "dispatch",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Per-recipient delivery classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryOutcome {
	/// Provider answered 2xx.
	Delivered,
	/// Provider answered with a non-2xx status.
	Rejected,
	/// No HTTP response was obtained.
	Unreachable,
}
impl DeliveryOutcome {
	/// Classifies a raw dispatch status; `0` marks a connection-level failure.
	pub const fn from_status(status: u16) -> Self {
		match status {
			0 => DeliveryOutcome::Unreachable,
			200..=299 => DeliveryOutcome::Delivered,
			_ => DeliveryOutcome::Rejected,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DeliveryOutcome::Delivered => "delivered",
			DeliveryOutcome::Rejected => "rejected",
			DeliveryOutcome::Unreachable => "unreachable",
		}
	}
}
impl Display for DeliveryOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn delivery_outcome_follows_status_class() {
		assert_eq!(DeliveryOutcome::from_status(0), DeliveryOutcome::Unreachable);
		assert_eq!(DeliveryOutcome::from_status(200), DeliveryOutcome::Delivered);
		assert_eq!(DeliveryOutcome::from_status(404), DeliveryOutcome::Rejected);
		assert_eq!(DeliveryOutcome::from_status(503).to_string(), "rejected");
	}
}
