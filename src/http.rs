//! Transport primitives for the token exchange and the FCM send calls.
//!
//! The module exposes [`RelayHttpClient`] alongside [`OutboundRequest`] and [`HttpReply`] so
//! callers can swap in their own HTTP stack (or a fake in tests) without touching the relay.
//! Implementations report any HTTP response, successful or not, as an [`HttpReply`]; only
//! failures that produce no response at all surface as [`TransportError`].

// self
use crate::{_prelude::*, auth::Secret, error::TransportError};

/// Boxed future returned by [`RelayHttpClient::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpReply, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing the relay's outbound POSTs.
///
/// The trait is the relay's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so one client can be shared by concurrent batches, and the returned
/// futures must be `Send` so dispatch fan-out can run on a multi-threaded executor.
pub trait RelayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the status and body of whatever came back.
	///
	/// Once a status line is received the call resolves with it, even when the body cannot be
	/// read; the body then describes the read failure.
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_>;
}

/// Body of an outbound POST.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundBody {
	/// `application/x-www-form-urlencoded` pairs.
	Form(Vec<(String, String)>),
	/// Pre-serialized `application/json` payload.
	Json(Vec<u8>),
}

/// Single outbound POST issued by the relay.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
	/// Target URL.
	pub url: Url,
	/// Optional bearer credential for the `Authorization` header.
	pub bearer: Option<Secret>,
	/// Request body.
	pub body: OutboundBody,
}
impl OutboundRequest {
	/// Builds a form-encoded POST.
	pub fn form<I, K, V>(url: Url, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let pairs = pairs.into_iter().map(|(key, value)| (key.into(), value.into())).collect();

		Self { url, bearer: None, body: OutboundBody::Form(pairs) }
	}

	/// Builds a JSON POST authenticated with `bearer`.
	pub fn json(url: Url, bearer: Secret, payload: Vec<u8>) -> Self {
		Self { url, bearer: Some(bearer), body: OutboundBody::Json(payload) }
	}

	/// Looks up a form field by name.
	pub fn form_value(&self, key: &str) -> Option<&str> {
		match &self.body {
			OutboundBody::Form(pairs) =>
				pairs.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str()),
			OutboundBody::Json(_) => None,
		}
	}
}

/// Status and raw body of an HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
	/// HTTP status code.
	pub status: u16,
	/// Response body decoded as text.
	pub body: String,
}
impl HttpReply {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client never follows redirects; Google's token and FCM endpoints answer
/// directly, so a redirect would only ever forward the assertion or bearer token elsewhere.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with the relay's defaults and a per-request timeout.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.timeout(timeout)
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RelayHttpClient for ReqwestHttpClient {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let OutboundRequest { url, bearer, body } = request;
			let mut builder = self.0.post(url.clone());

			if let Some(bearer) = bearer {
				builder = builder.bearer_auth(bearer.expose());
			}

			builder = match body {
				OutboundBody::Form(pairs) => builder.form(&pairs),
				OutboundBody::Json(payload) => builder
					.header(reqwest::header::CONTENT_TYPE, "application/json")
					.body(payload),
			};

			let response =
				builder.send().await.map_err(|err| TransportError::network(&url, err))?;
			let status = response.status().as_u16();
			// The status line already arrived, so a broken body still reports it.
			let body = match response.text().await {
				Ok(body) => body,
				Err(err) => crate::error::flatten_chain(&TransportError::network(&url, err)),
			};

			Ok(HttpReply { status, body })
		})
	}
}
