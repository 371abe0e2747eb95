//! Process configuration read from the environment.

// std
use std::net::SocketAddr;
// self
use crate::{_prelude::*, auth::ServiceAccountCredential, error::ConfigError};

/// Variable holding the base64 JSON service-account document.
pub const ENV_SERVICE_ACCOUNT: &str = "FIREBASE_SERVICE_ACCOUNT_KEY_BASE64";
/// Variable holding the listen address.
pub const ENV_ADDR: &str = "FCM_RELAY_ADDR";
/// Variable holding the dispatch fan-out window.
pub const ENV_DISPATCH_CONCURRENCY: &str = "FCM_RELAY_DISPATCH_CONCURRENCY";
/// Variable holding the outbound request timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "FCM_RELAY_HTTP_TIMEOUT_SECS";
/// Variable toggling the access-token cache.
pub const ENV_TOKEN_CACHE: &str = "FCM_RELAY_TOKEN_CACHE";

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
/// Default number of sends in flight per batch.
pub const DEFAULT_DISPATCH_CONCURRENCY: usize = 8;
/// Default outbound timeout.
pub const DEFAULT_HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Fully resolved relay configuration.
#[derive(Clone, Debug)]
pub struct RelayConfig {
	/// Service-account identity used for every exchange.
	pub credential: ServiceAccountCredential,
	/// Address the HTTP listener binds to.
	pub bind_addr: SocketAddr,
	/// Maximum number of concurrent sends within one batch.
	pub dispatch_concurrency: usize,
	/// Per-request timeout applied to outbound calls.
	pub request_timeout: std::time::Duration,
	/// Whether access tokens are cached across batches.
	pub token_cache: bool,
}
impl RelayConfig {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the configuration through `lookup`, which returns a variable's value if set.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let encoded = lookup(ENV_SERVICE_ACCOUNT)
			.filter(|value| !value.trim().is_empty())
			.ok_or(ConfigError::MissingEnv { name: ENV_SERVICE_ACCOUNT })?;
		let credential = ServiceAccountCredential::from_base64_json(&encoded)?;
		let bind_addr = parse_or(&lookup, ENV_ADDR, || {
			SocketAddr::from_str(DEFAULT_ADDR).map_err(|e| invalid(ENV_ADDR, e))
		})?;
		let dispatch_concurrency =
			parse_or(&lookup, ENV_DISPATCH_CONCURRENCY, || Ok(DEFAULT_DISPATCH_CONCURRENCY))?;

		if dispatch_concurrency == 0 {
			return Err(ConfigError::InvalidEnv {
				name: ENV_DISPATCH_CONCURRENCY,
				reason: "must be at least 1".into(),
			});
		}

		let timeout_secs =
			parse_or(&lookup, ENV_HTTP_TIMEOUT_SECS, || Ok(DEFAULT_HTTP_TIMEOUT.as_secs()))?;

		if timeout_secs == 0 {
			return Err(ConfigError::InvalidEnv {
				name: ENV_HTTP_TIMEOUT_SECS,
				reason: "must be at least 1".into(),
			});
		}

		let token_cache = match lookup(ENV_TOKEN_CACHE) {
			None => false,
			Some(value) => parse_flag(&value).ok_or_else(|| ConfigError::InvalidEnv {
				name: ENV_TOKEN_CACHE,
				reason: format!("expected true, false, 1, or 0 but got `{value}`"),
			})?,
		};

		Ok(Self {
			credential,
			bind_addr,
			dispatch_concurrency,
			request_timeout: std::time::Duration::from_secs(timeout_secs),
			token_cache,
		})
	}
}

fn parse_or<F, T, D>(lookup: &F, name: &'static str, default: D) -> Result<T, ConfigError>
where
	F: Fn(&str) -> Option<String>,
	T: FromStr,
	T::Err: Display,
	D: FnOnce() -> Result<T, ConfigError>,
{
	match lookup(name) {
		Some(value) if !value.trim().is_empty() =>
			value.trim().parse().map_err(|e| invalid(name, e)),
		_ => default(),
	}
}

fn parse_flag(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" => Some(true),
		"false" | "0" => Some(false),
		_ => None,
	}
}

fn invalid(name: &'static str, e: impl Display) -> ConfigError {
	ConfigError::InvalidEnv { name, reason: e.to_string() }
}
