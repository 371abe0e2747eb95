//! Folds the pipeline outcome into the response body returned to the caller.

// self
use crate::{_prelude::*, relay::DispatchOutcome};

/// Overall status reported when the pipeline ran to completion.
pub const COMPLETED_STATUS: u16 = 200;
/// Overall status reported when nothing was sent.
pub const FAILED_STATUS: u16 = 500;

/// Response body for one batch.
///
/// Serializes as `{"fcmStatus":200,"fcmResponses":[...]}` or
/// `{"fcmStatus":500,"fcmResponse":"...","stack":"..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchResult {
	/// Every recipient was attempted; inspect each outcome for delivery.
	Completed {
		/// Always [`COMPLETED_STATUS`].
		#[serde(rename = "fcmStatus")]
		fcm_status: u16,
		/// One outcome per recipient, in input order.
		#[serde(rename = "fcmResponses")]
		fcm_responses: Vec<DispatchOutcome>,
	},
	/// The pipeline failed before dispatch; no recipient was attempted.
	Failed {
		/// Always [`FAILED_STATUS`].
		#[serde(rename = "fcmStatus")]
		fcm_status: u16,
		/// Display message of the failure.
		#[serde(rename = "fcmResponse")]
		fcm_response: String,
		/// Failure followed by its causes.
		stack: String,
	},
}
impl BatchResult {
	/// Wraps per-recipient outcomes.
	pub fn completed(outcomes: Vec<DispatchOutcome>) -> Self {
		Self::Completed { fcm_status: COMPLETED_STATUS, fcm_responses: outcomes }
	}

	/// Describes a pipeline failure.
	pub fn failed(error: &Error) -> Self {
		Self::Failed {
			fcm_status: FAILED_STATUS,
			fcm_response: error.to_string(),
			stack: error.diagnostic(),
		}
	}

	/// HTTP status the response should carry.
	pub fn http_status(&self) -> u16 {
		match self {
			Self::Completed { fcm_status, .. } | Self::Failed { fcm_status, .. } => *fcm_status,
		}
	}

	/// Per-recipient outcomes; empty for failures.
	pub fn outcomes(&self) -> &[DispatchOutcome] {
		match self {
			Self::Completed { fcm_responses, .. } => fcm_responses,
			Self::Failed { .. } => &[],
		}
	}
}

/// Collapses a pipeline result into a [`BatchResult`].
///
/// Completion is reported as 200 regardless of per-recipient statuses.
pub fn aggregate(result: Result<Vec<DispatchOutcome>>) -> BatchResult {
	match result {
		Ok(outcomes) => BatchResult::completed(outcomes),
		Err(e) => BatchResult::failed(&e),
	}
}
