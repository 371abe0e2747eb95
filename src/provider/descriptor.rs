//! Provider descriptor data structures shared by the exchanger and the dispatcher.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::ProjectId,
	error::ConfigError,
};

/// Google's OAuth 2.0 token endpoint.
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
/// FCM v1 API host.
pub const FCM_MESSAGING_ENDPOINT: &str = "https://fcm.googleapis.com";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Token endpoint receiving the JWT-bearer grant.
	pub token: Url,
	/// Base URL under which `/v1/projects/<id>/messages:send` lives.
	pub messaging: Url,
}

/// Immutable provider descriptor consumed by the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Scope requested in every assertion.
	pub scope: String,
	/// Audience written into every assertion.
	pub audience: String,
}
impl ProviderDescriptor {
	/// Creates a new builder seeded with Google's endpoints.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new()
	}

	/// Google OAuth + FCM v1 defaults.
	pub fn firebase() -> Result<Self, ProviderDescriptorError> {
		Self::builder().build()
	}

	/// Builds the per-project send URL.
	pub fn send_endpoint(&self, project: &ProjectId) -> Result<Url, ConfigError> {
		let mut url = self.endpoints.messaging.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::SendEndpoint {
				endpoint: self.endpoints.messaging.to_string(),
			})?
			.pop_if_empty()
			.extend(["v1", "projects", project.as_ref(), "messages:send"]);

		Ok(url)
	}
}
