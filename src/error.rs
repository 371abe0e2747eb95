//! Relay-level error types shared across the signer, exchanger, configuration, and server.

// self
use crate::{
	_prelude::*,
	auth::IdentifierError,
	provider::ProviderDescriptorError,
	relay::ValidationError,
};

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Inbound request failed validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Assertion could not be signed with the service-account key.
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// Token endpoint did not yield a usable access token.
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),

	/// HTTP listener failed to bind or stopped unexpectedly.
	#[error("HTTP server failed.")]
	Server {
		/// Underlying socket failure.
		#[source]
		source: std::io::Error,
	},
}
impl Error {
	/// Renders the error message followed by every underlying cause, one per line.
	pub fn diagnostic(&self) -> String {
		render_chain(self, "\n  caused by: ")
	}
}

/// Configuration and startup failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Required environment variable is absent.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// Service-account document is not valid base64.
	#[error("Service account document is not valid base64.")]
	CredentialEncoding {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Service-account document is not the expected JSON shape.
	#[error("Service account document is malformed.")]
	CredentialDocument {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Service-account identifiers failed validation.
	#[error("Service account document contains an invalid identifier.")]
	InvalidIdentifier(#[from] IdentifierError),
	/// Service-account private key cannot be used for signing.
	#[error("Service account private key cannot be used for signing.")]
	InvalidPrivateKey {
		/// Underlying key failure.
		#[source]
		source: CredentialError,
	},
	/// Provider descriptor failed validation.
	#[error("Provider descriptor is invalid.")]
	Descriptor(#[from] ProviderDescriptorError),
	/// Messaging endpoint cannot carry the per-project send path.
	#[error("Messaging endpoint `{endpoint}` cannot carry path segments.")]
	SendEndpoint {
		/// Offending endpoint.
		endpoint: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while turning the private key into a signed assertion.
#[derive(Debug, ThisError)]
pub enum CredentialError {
	/// PEM body is not valid base64.
	#[error("Private key is not valid base64.")]
	KeyEncoding {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Decoded key material is not a PKCS#8 RSA key.
	#[error("Private key is not a valid PKCS#8 RSA key.")]
	KeyImport {
		/// Underlying PKCS#8 failure.
		#[source]
		source: rsa::pkcs8::Error,
	},
	/// Assertion header or claims could not be serialized.
	#[error("Assertion claims could not be encoded.")]
	ClaimsEncoding(#[source] serde_json::Error),
	/// RSA signing failed.
	#[error("Assertion could not be signed.")]
	Signing {
		/// Underlying signature failure.
		#[source]
		source: rsa::signature::Error,
	},
}

/// Token endpoint failures; each one aborts the whole batch.
#[derive(Debug, ThisError)]
pub enum TokenExchangeError {
	/// Token endpoint answered with a non-success status.
	#[error("Failed to get access token: {body}")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Token endpoint response omitted `access_token`.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// Token endpoint returned a non-positive `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Token endpoint could not be reached.
	#[error("Token endpoint could not be reached.")]
	Transport(#[from] TransportError),
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Endpoint host and path that was being called.
		endpoint: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error raised while calling `url`.
	pub fn network(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint: endpoint_label(url), source: Box::new(src) }
	}
}

/// Renders `error` and its causes on one line.
pub(crate) fn flatten_chain(error: &(dyn StdError + 'static)) -> String {
	render_chain(error, " caused by: ")
}

fn render_chain(error: &(dyn StdError + 'static), separator: &str) -> String {
	let mut rendered = error.to_string();
	let mut source = error.source();

	while let Some(cause) = source {
		rendered.push_str(separator);
		rendered.push_str(&cause.to_string());

		source = cause.source();
	}

	rendered
}

fn endpoint_label(url: &Url) -> String {
	format!("{}{}", url.host_str().unwrap_or_default(), url.path())
}
