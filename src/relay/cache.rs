//! Optional in-process access-token cache shared by every batch.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Holds the current access token and serializes refreshes.
///
/// Reads take a short `parking_lot` lock; refreshes run under an async singleflight lock so
/// concurrent batches that miss the cache trigger at most one exchange.
#[derive(Debug)]
pub struct TokenCache {
	current: Mutex<Option<AccessToken>>,
	refresh: AsyncMutex<()>,
	preemptive_window: Duration,
}
impl TokenCache {
	/// Refresh lead time used when none is supplied.
	pub const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates an empty cache that refreshes tokens `preemptive_window` before expiry.
	pub fn new(preemptive_window: Duration) -> Self {
		Self {
			current: Mutex::new(None),
			refresh: AsyncMutex::new(()),
			preemptive_window: if preemptive_window.is_negative() {
				Duration::ZERO
			} else {
				preemptive_window
			},
		}
	}

	/// Lead time before expiry at which a cached token stops being served.
	pub fn preemptive_window(&self) -> Duration {
		self.preemptive_window
	}

	/// Determines whether `token` should be replaced at `now`.
	pub fn should_refresh(&self, token: &AccessToken, now: OffsetDateTime) -> bool {
		token.is_expired_at(now) || token.remaining_at(now) <= self.preemptive_window
	}

	/// Returns the cached token if it is still usable at `now`.
	pub fn fresh_at(&self, now: OffsetDateTime) -> Option<AccessToken> {
		self.current.lock().as_ref().filter(|token| !self.should_refresh(token, now)).cloned()
	}

	/// Replaces the cached token.
	pub fn store(&self, token: AccessToken) {
		*self.current.lock() = Some(token);
	}

	/// Drops the cached token.
	pub fn clear(&self) {
		self.current.lock().take();
	}

	/// Serves the cached token or runs `refresh` once, caching its result.
	///
	/// Failed refreshes leave the cache untouched and are returned to the caller.
	pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<AccessToken, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<AccessToken, E>>,
	{
		if let Some(token) = self.fresh_at(OffsetDateTime::now_utc()) {
			return Ok(token);
		}

		let _guard = self.refresh.lock().await;

		// Another batch may have refreshed while this one waited.
		if let Some(token) = self.fresh_at(OffsetDateTime::now_utc()) {
			return Ok(token);
		}

		let token = refresh().await?;

		self.store(token.clone());

		Ok(token)
	}
}
impl Default for TokenCache {
	fn default() -> Self {
		Self::new(Self::DEFAULT_PREEMPTIVE_WINDOW)
	}
}
