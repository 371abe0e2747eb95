//! Inbound HTTP surface: one catch-all route in front of the relay.
//!
//! Every response, including rejections, carries permissive CORS headers so browser clients
//! can call the relay directly.

// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	http::{HeaderName, HeaderValue, Method, StatusCode, header},
	response::{IntoResponse, Response},
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::{
	_prelude::*,
	config::RelayConfig,
	error::ConfigError,
	http::RelayHttpClient,
	relay::{NotificationRequest, Relay},
};

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "fcm_relay=info,tower_http=info";
/// Origins allowed to call the relay.
pub const CORS_ALLOW_ORIGIN: &str = "*";
/// Methods advertised to browsers.
pub const CORS_ALLOW_METHODS: &str = "POST, OPTIONS";
/// Request headers browsers may send.
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization, apikey, x-client-info";

/// Builds the router serving every path with `relay`.
pub fn router<C>(relay: Arc<Relay<C>>) -> Router
where
	C: ?Sized + RelayHttpClient,
{
	Router::new()
		.fallback(handle::<C>)
		.with_state(relay)
		.layer(cors(header::ACCESS_CONTROL_ALLOW_ORIGIN, CORS_ALLOW_ORIGIN))
		.layer(cors(header::ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS))
		.layer(cors(header::ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS))
		.layer(TraceLayer::new_for_http())
}

fn cors(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
	SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

async fn handle<C>(State(relay): State<Arc<Relay<C>>>, method: Method, body: Bytes) -> Response
where
	C: ?Sized + RelayHttpClient,
{
	if method == Method::OPTIONS {
		return (StatusCode::OK, "ok").into_response();
	}
	if method != Method::POST {
		return (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
	}

	let request = match NotificationRequest::from_slice(&body) {
		Ok(request) => request,
		Err(e) => {
			tracing::info!(error = ?e, "Rejected batch request.");

			return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
		},
	};
	let result = relay.send_batch(&request).await;
	let status =
		StatusCode::from_u16(result.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	(status, Json(result)).into_response()
}

/// Installs the global `tracing` subscriber; later calls are no-ops.
pub fn init_tracing() {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
	let _ = tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer())
		.try_init();
}

/// Loads `.env` when present, then reads [`RelayConfig`] from the environment.
pub fn load_config() -> Result<RelayConfig, ConfigError> {
	match dotenvy::dotenv() {
		Err(e) if !e.not_found() => tracing::warn!(error = %e, "Ignoring unreadable .env file."),
		_ => {},
	}

	RelayConfig::from_env()
}

/// Binds the listener and serves until Ctrl-C.
pub async fn serve(config: RelayConfig) -> Result<()> {
	let relay = Arc::new(Relay::from_config(&config)?);
	let listener = tokio::net::TcpListener::bind(config.bind_addr)
		.await
		.map_err(|source| Error::Server { source })?;

	tracing::info!(
		addr = %config.bind_addr,
		project_id = %config.credential.project_id,
		dispatch_concurrency = config.dispatch_concurrency,
		token_cache = config.token_cache,
		"FCM relay listening."
	);

	axum::serve(listener, router(relay))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(|source| Error::Server { source })
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => tracing::info!("Shutdown signal received."),
		Err(e) => {
			tracing::error!(error = %e, "Ctrl-C handler could not be installed.");

			std::future::pending::<()>().await;
		},
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::body::Body;
	use tower::ServiceExt;
	// self
	use super::*;
	use crate::{
		auth::{ClientEmail, ProjectId, ServiceAccountCredential},
		error::TransportError,
		http::{HttpReply, OutboundRequest, TransportFuture},
		provider::ProviderDescriptor,
	};

	/// Refuses every call; any attempt shows up in the counter.
	#[derive(Default)]
	struct CountingClient(std::sync::atomic::AtomicUsize);
	impl RelayHttpClient for CountingClient {
		fn execute(&self, _: OutboundRequest) -> TransportFuture<'_> {
			self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

			Box::pin(async {
				Err::<HttpReply, _>(TransportError::Io(std::io::Error::other("offline")))
			})
		}
	}

	fn relay() -> Arc<Relay<CountingClient>> {
		let credential = ServiceAccountCredential::new(
			ClientEmail::new("relay@demo-project.iam.gserviceaccount.com")
				.expect("Fixture email should be valid."),
			"unused",
			ProjectId::new("demo-project").expect("Fixture project should be valid."),
		);
		let descriptor = ProviderDescriptor::firebase().expect("Firebase defaults should validate.");

		Arc::new(Relay::with_http_client(credential, descriptor, CountingClient::default()))
	}

	fn request(method: Method, body: &'static str) -> axum::http::Request<Body> {
		axum::http::Request::builder()
			.method(method)
			.uri("/functions/v1/push")
			.body(Body::from(body))
			.expect("Fixture request should build.")
	}

	#[tokio::test]
	async fn preflight_is_answered_without_the_pipeline() {
		let relay = relay();
		let response = router(relay.clone())
			.oneshot(request(Method::OPTIONS, ""))
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], CORS_ALLOW_ORIGIN);
		assert_eq!(relay.http_client.0.load(std::sync::atomic::Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn other_methods_are_not_allowed() {
		let response = router(relay())
			.oneshot(request(Method::GET, ""))
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], CORS_ALLOW_METHODS);
	}

	#[tokio::test]
	async fn corrupt_keys_fail_the_batch_with_a_stack() {
		let relay = relay();
		let response = router(relay.clone())
			.oneshot(request(Method::POST, r#"{"tokens":["tokA"],"title":"Hi","body":"There"}"#))
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], CORS_ALLOW_HEADERS);
		assert_eq!(relay.http_client.0.load(std::sync::atomic::Ordering::SeqCst), 0);
	}
}
