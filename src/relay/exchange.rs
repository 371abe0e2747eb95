//! JWT-bearer grant: trade a signed assertion for a short-lived access token.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, SignedAssertion},
	error::TokenExchangeError,
	http::{HttpReply, OutboundRequest, RelayHttpClient},
	obs::{Stage, StageSpan},
	relay::Relay,
};

/// Grant type registered for JWT bearer assertions (RFC 7523).
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Deserialize)]
struct TokenResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
}

impl<C> Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// Posts `assertion` to the token endpoint and parses the bearer token out of the reply.
	///
	/// Any failure here aborts the batch; there is no retry.
	pub async fn exchange(
		&self,
		assertion: &SignedAssertion,
	) -> Result<AccessToken, TokenExchangeError> {
		let span = StageSpan::new(Stage::Exchange);
		let request = OutboundRequest::form(
			self.descriptor.endpoints.token.clone(),
			[("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", assertion.expose())],
		);
		let result = span
			.instrument(async {
				let reply = self.http_client.execute(request).await?;

				parse_token_reply(reply, OffsetDateTime::now_utc())
			})
			.await;

		span.finish(result)
	}
}

/// Interprets a token endpoint reply received at `issued_at`.
pub(crate) fn parse_token_reply(
	reply: HttpReply,
	issued_at: OffsetDateTime,
) -> Result<AccessToken, TokenExchangeError> {
	if !reply.is_success() {
		return Err(TokenExchangeError::Rejected { status: reply.status, body: reply.body });
	}

	let de = &mut serde_json::Deserializer::from_str(&reply.body);
	let parsed: TokenResponse = serde_path_to_error::deserialize(de)
		.map_err(|source| TokenExchangeError::MalformedResponse { source, status: reply.status })?;
	let secret = parsed
		.access_token
		.filter(|token| !token.is_empty())
		.ok_or(TokenExchangeError::MissingAccessToken)?;
	let lifetime = match parsed.expires_in {
		Some(secs) if secs <= 0 => return Err(TokenExchangeError::NonPositiveExpiresIn),
		Some(secs) => Duration::seconds(secs),
		None => AccessToken::DEFAULT_LIFETIME,
	};

	Ok(AccessToken::new(secret, issued_at, lifetime))
}
