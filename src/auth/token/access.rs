//! Short-lived bearer token minted by the token endpoint.

// self
use crate::{_prelude::*, auth::token::secret::Secret};

/// Bearer token plus the validity window declared by the provider.
#[derive(Clone)]
pub struct AccessToken {
	/// Bearer secret; callers must avoid logging it.
	pub secret: Secret,
	/// Instant the relay received the token.
	pub issued_at: OffsetDateTime,
	/// Instant derived from `issued_at + expires_in`.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Lifetime assumed when the provider omits `expires_in`.
	pub const DEFAULT_LIFETIME: Duration = Duration::seconds(3600);

	/// Creates a token valid for `lifetime` starting at `issued_at`.
	pub fn new(secret: impl Into<String>, issued_at: OffsetDateTime, lifetime: Duration) -> Self {
		Self { secret: Secret::new(secret), issued_at, expires_at: issued_at + lifetime }
	}

	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Remaining validity at `instant`; zero once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		if self.is_expired_at(instant) { Duration::ZERO } else { self.expires_at - instant }
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("secret", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
