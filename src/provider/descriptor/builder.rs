// std
use std::net::IpAddr;
// self
use crate::{
	_prelude::*,
	auth::{FIREBASE_MESSAGING_SCOPE, GOOGLE_TOKEN_AUDIENCE},
	provider::{
		FCM_MESSAGING_ENDPOINT, GOOGLE_TOKEN_ENDPOINT, ProviderDescriptor, ProviderEndpoints,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Endpoint string could not be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidUrl {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Scope and audience must be non-empty.
	#[error("The assertion {field} cannot be empty.")]
	EmptyClaim {
		/// Claim name.
		field: &'static str,
	},
}

/// Builder for [`ProviderDescriptor`] values, seeded with Google's defaults.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Token endpoint override.
	pub token_endpoint: Option<Url>,
	/// Messaging base endpoint override.
	pub messaging_endpoint: Option<Url>,
	/// Scope requested in assertions.
	pub scope: String,
	/// Audience written into assertions.
	pub audience: String,
}
impl ProviderDescriptorBuilder {
	/// Creates a builder with Google's scope and audience and no endpoint overrides.
	pub fn new() -> Self {
		Self {
			token_endpoint: None,
			messaging_endpoint: None,
			scope: FIREBASE_MESSAGING_SCOPE.into(),
			audience: GOOGLE_TOKEN_AUDIENCE.into(),
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the messaging base endpoint.
	pub fn messaging_endpoint(mut self, url: Url) -> Self {
		self.messaging_endpoint = Some(url);

		self
	}

	/// Overrides the assertion scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();

		self
	}

	/// Overrides the assertion audience. The audience stays Google's token URL even when the
	/// token endpoint is redirected to a mock.
	pub fn audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = audience.into();

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let token = match self.token_endpoint {
			Some(url) => url,
			None => parse_default("token", GOOGLE_TOKEN_ENDPOINT)?,
		};
		let messaging = match self.messaging_endpoint {
			Some(url) => url,
			None => parse_default("messaging", FCM_MESSAGING_ENDPOINT)?,
		};
		let descriptor = ProviderDescriptor {
			endpoints: ProviderEndpoints { token, messaging },
			scope: self.scope,
			audience: self.audience,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}
impl Default for ProviderDescriptorBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("messaging", &self.endpoints.messaging)?;

		if self.scope.trim().is_empty() {
			return Err(ProviderDescriptorError::EmptyClaim { field: "scope" });
		}
		if self.audience.trim().is_empty() {
			return Err(ProviderDescriptorError::EmptyClaim { field: "audience" });
		}

		Ok(())
	}
}

fn parse_default(endpoint: &'static str, raw: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|source| ProviderDescriptorError::InvalidUrl { endpoint, source })
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.map(|ip| ip.is_loopback())
			.unwrap_or(false),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}

	#[test]
	fn loopback_http_is_allowed_for_mocks() {
		let descriptor = ProviderDescriptor::builder()
			.token_endpoint(url("http://127.0.0.1:4000/token"))
			.messaging_endpoint(url("http://localhost:4000"))
			.build()
			.expect("Loopback endpoints should validate.");

		assert_eq!(descriptor.endpoints.token.as_str(), "http://127.0.0.1:4000/token");
		assert!(
			ProviderDescriptor::builder()
				.messaging_endpoint(url("http://[::1]:4000/"))
				.build()
				.is_ok()
		);
	}

	#[test]
	fn remote_http_is_rejected() {
		let err = ProviderDescriptor::builder()
			.token_endpoint(url("http://oauth2.example.com/token"))
			.build()
			.expect_err("Plain HTTP to a remote host must be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
	}

	#[test]
	fn opaque_urls_are_rejected() {
		let err = ProviderDescriptor::builder()
			.messaging_endpoint(url("data:text/plain,fcm"))
			.build()
			.expect_err("Opaque URLs must be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { .. }));
	}

	#[test]
	fn empty_claims_are_rejected() {
		assert_eq!(
			ProviderDescriptor::builder().scope(" ").build(),
			Err(ProviderDescriptorError::EmptyClaim { field: "scope" })
		);
		assert_eq!(
			ProviderDescriptor::builder().audience("").build(),
			Err(ProviderDescriptorError::EmptyClaim { field: "audience" })
		);
	}
}
