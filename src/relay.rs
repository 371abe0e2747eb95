//! Relay facade: sign, exchange, dispatch, aggregate.

pub mod aggregate;
pub mod cache;
pub mod dispatch;
pub mod exchange;
pub mod request;

pub use aggregate::*;
pub use cache::*;
pub use dispatch::*;
pub use exchange::JWT_BEARER_GRANT_TYPE;
pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ServiceAccountCredential, SignedAssertion},
	config,
	error::CredentialError,
	http::RelayHttpClient,
	obs::{Stage, StageSpan},
	provider::ProviderDescriptor,
};
#[cfg(feature = "reqwest")]
use crate::{config::RelayConfig, error::ConfigError, http::ReqwestHttpClient};

/// Relay specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestRelay = Relay<ReqwestHttpClient>;

/// Turns one [`NotificationRequest`] into one [`BatchResult`].
///
/// The relay owns the shared, read-only pieces of the pipeline: the HTTP transport, the provider
/// descriptor, and the service-account credential. Each batch signs a fresh assertion and
/// exchanges it unless the token cache is enabled.
pub struct Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// HTTP client used for every outbound call.
	pub http_client: Arc<C>,
	/// Token and messaging endpoints plus assertion claims.
	pub descriptor: ProviderDescriptor,
	/// Service-account identity.
	pub credential: Arc<ServiceAccountCredential>,
	dispatch_concurrency: usize,
	token_cache: Option<TokenCache>,
}
impl<C> Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// Creates a relay around a caller-provided transport.
	pub fn with_http_client(
		credential: impl Into<Arc<ServiceAccountCredential>>,
		descriptor: ProviderDescriptor,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			descriptor,
			credential: credential.into(),
			dispatch_concurrency: config::DEFAULT_DISPATCH_CONCURRENCY,
			token_cache: None,
		}
	}

	/// Sets the dispatch window; values below 1 are raised to 1.
	pub fn with_dispatch_concurrency(mut self, concurrency: usize) -> Self {
		self.dispatch_concurrency = concurrency.max(1);

		self
	}

	/// Maximum number of sends in flight within one batch; never below 1.
	pub fn dispatch_concurrency(&self) -> usize {
		self.dispatch_concurrency
	}

	/// Enables the access-token cache with the given preemptive window.
	pub fn with_token_cache(mut self, preemptive_window: Duration) -> Self {
		self.token_cache = Some(TokenCache::new(preemptive_window));

		self
	}

	/// Returns the token cache when enabled.
	pub fn token_cache(&self) -> Option<&TokenCache> {
		self.token_cache.as_ref()
	}

	/// Signs a fresh assertion for the configured scope and audience.
	pub fn sign(&self, now: OffsetDateTime) -> Result<SignedAssertion, CredentialError> {
		let span = StageSpan::new(Stage::Sign);
		let result = {
			let _guard = span.clone().entered();

			SignedAssertion::sign_for(
				&self.credential,
				&self.descriptor.scope,
				&self.descriptor.audience,
				now,
			)
		};

		span.finish(result)
	}

	/// Returns a bearer token, from the cache when enabled and still fresh.
	pub async fn access_token(&self) -> Result<AccessToken> {
		match &self.token_cache {
			Some(cache) => cache.get_or_refresh(|| self.mint_access_token()).await,
			None => self.mint_access_token().await,
		}
	}

	async fn mint_access_token(&self) -> Result<AccessToken> {
		let assertion = self.sign(OffsetDateTime::now_utc())?;

		Ok(self.exchange(&assertion).await?)
	}

	/// Runs the pipeline up to and including dispatch.
	///
	/// Errors mean nothing was sent; per-recipient failures are reported as outcomes.
	pub async fn run(&self, request: &NotificationRequest) -> Result<Vec<DispatchOutcome>> {
		let token = self.access_token().await?;

		self.dispatch(&token, &self.credential.project_id, request).await
	}

	/// Runs the pipeline and folds the outcome into the response body.
	pub async fn send_batch(&self, request: &NotificationRequest) -> BatchResult {
		tracing::info!(recipients = request.tokens.len(), "Batch received.");

		let result = self.run(request).await;

		if let Err(e) = &result {
			tracing::error!(error = %e.diagnostic(), "Batch failed before dispatch.");
		}

		aggregate(result)
	}
}
#[cfg(feature = "reqwest")]
impl Relay<ReqwestHttpClient> {
	/// Creates a relay with a reqwest transport using the default timeout.
	pub fn new(
		credential: impl Into<Arc<ServiceAccountCredential>>,
		descriptor: ProviderDescriptor,
	) -> Result<Self, ConfigError> {
		let client = ReqwestHttpClient::with_timeout(config::DEFAULT_HTTP_TIMEOUT)?;

		Ok(Self::with_http_client(credential, descriptor, client))
	}

	/// Creates the production relay described by `config`.
	pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
		let client = ReqwestHttpClient::with_timeout(config.request_timeout)?;
		let relay = Self::with_http_client(
			config.credential.clone(),
			ProviderDescriptor::firebase()?,
			client,
		)
		.with_dispatch_concurrency(config.dispatch_concurrency);

		Ok(if config.token_cache {
			relay.with_token_cache(TokenCache::DEFAULT_PREEMPTIVE_WINDOW)
		} else {
			relay
		})
	}
}
impl<C> Debug for Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay")
			.field("descriptor", &self.descriptor)
			.field("client_email", &self.credential.client_email)
			.field("project_id", &self.credential.project_id)
			.field("dispatch_concurrency", &self.dispatch_concurrency)
			.field("token_cache", &self.token_cache.is_some())
			.finish()
	}
}
