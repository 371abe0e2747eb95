//! Inbound batch request and its validation rules.

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Rejections raised before any outbound call is made.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// Body is not parseable JSON.
	#[error("Invalid JSON")]
	InvalidJson {
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// A required field is absent, empty, or of the wrong type.
	#[error("Missing or invalid fields")]
	MissingFields {
		/// Path of the offending field.
		field: String,
	},
}

/// One logical notification addressed to an ordered list of device tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
	/// Recipient device tokens; output order follows this order.
	pub tokens: Vec<String>,
	/// Notification title.
	pub title: String,
	/// Notification body.
	pub body: String,
}
impl NotificationRequest {
	/// Builds a validated request.
	pub fn new<I, S>(
		tokens: I,
		title: impl Into<String>,
		body: impl Into<String>,
	) -> Result<Self, ValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let request = Self {
			tokens: tokens.into_iter().map(Into::into).collect(),
			title: title.into(),
			body: body.into(),
		};

		request.validate()?;

		Ok(request)
	}

	/// Parses and validates a raw JSON body.
	///
	/// Syntax errors map to [`ValidationError::InvalidJson`]; anything that parses but does not
	/// match `{tokens: [string, ...], title: string, body: string}` maps to
	/// [`ValidationError::MissingFields`].
	pub fn from_slice(raw: &[u8]) -> Result<Self, ValidationError> {
		let value = serde_json::from_slice::<Value>(raw)
			.map_err(|source| ValidationError::InvalidJson { source })?;
		let request: Self = serde_path_to_error::deserialize(value).map_err(|e| {
			let path = e.path().to_string();
			let field = if path == "." { e.into_inner().to_string() } else { path };

			ValidationError::MissingFields { field }
		})?;

		request.validate()?;

		Ok(request)
	}

	/// Checks that the batch has recipients plus a non-empty title and body.
	pub fn validate(&self) -> Result<(), ValidationError> {
		let missing = |field: &str| ValidationError::MissingFields { field: field.into() };

		if self.tokens.is_empty() {
			return Err(missing("tokens"));
		}
		if self.title.is_empty() {
			return Err(missing("title"));
		}
		if self.body.is_empty() {
			return Err(missing("body"));
		}

		Ok(())
	}
}
