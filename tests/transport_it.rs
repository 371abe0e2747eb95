// std
use std::sync::Arc;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use tokio::{
	io::{AsyncReadExt, AsyncWriteExt},
	net::TcpListener,
};
// self
use fcm_relay::{
	auth::{FIREBASE_MESSAGING_SCOPE, GOOGLE_TOKEN_AUDIENCE, Secret},
	error::TransportError,
	http::{
		HttpReply, OutboundBody, OutboundRequest, ReqwestHttpClient, RelayHttpClient,
		TransportFuture,
	},
	url::Url,
	provider::ProviderDescriptor,
	relay::{JWT_BEARER_GRANT_TYPE, Relay},
};

mod common;

/// Records every request and answers from a fixed script.
#[derive(Default)]
struct RecordingClient {
	requests: Mutex<Vec<OutboundRequest>>,
	fail_sends: bool,
}
impl RelayHttpClient for RecordingClient {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		let is_token = request.url.path() == "/token";

		self.requests.lock().push(request);

		Box::pin(async move {
			if is_token {
				return Ok(HttpReply {
					status: 200,
					body: "{\"access_token\":\"ya29.recorded\",\"expires_in\":3600}".into(),
				});
			}
			if self.fail_sends {
				return Err(TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::TimedOut,
					"deadline elapsed",
				)));
			}

			Ok(HttpReply { status: 200, body: "{\"name\":\"ok\"}".into() })
		})
	}
}

fn relay(client: Arc<RecordingClient>) -> Relay<RecordingClient> {
	Relay::with_http_client(
		common::credential(),
		ProviderDescriptor::firebase().expect("Firebase defaults should validate."),
		client,
	)
}

#[tokio::test]
async fn exchange_posts_a_jwt_bearer_grant() {
	let client = Arc::new(RecordingClient::default());
	let relay = relay(client.clone());
	let result = relay.send_batch(&common::batch(&["tokA"])).await;

	assert_eq!(result.http_status(), 200);

	let requests = client.requests.lock();

	assert_eq!(requests.len(), 2);

	let exchange = &requests[0];

	assert_eq!(exchange.url.as_str(), "https://oauth2.googleapis.com/token");
	assert!(exchange.bearer.is_none());
	assert_eq!(exchange.form_value("grant_type"), Some(JWT_BEARER_GRANT_TYPE));

	let assertion = exchange.form_value("assertion").expect("Assertion should be posted.");
	let segments = assertion.split('.').collect::<Vec<_>>();

	assert_eq!(segments.len(), 3);

	let claims: serde_json::Value = serde_json::from_slice(
		&URL_SAFE_NO_PAD.decode(segments[1]).expect("Claims should be base64url."),
	)
	.expect("Claims should be JSON.");

	assert_eq!(claims["iss"], common::CLIENT_EMAIL);
	assert_eq!(claims["scope"], FIREBASE_MESSAGING_SCOPE);
	assert_eq!(claims["aud"], GOOGLE_TOKEN_AUDIENCE);
	assert_eq!(
		claims["exp"].as_i64().zip(claims["iat"].as_i64()).map(|(exp, iat)| exp - iat),
		Some(3600)
	);

	let send = &requests[1];

	assert_eq!(
		send.url.as_str(),
		"https://fcm.googleapis.com/v1/projects/demo-project/messages:send"
	);
	assert_eq!(send.bearer.as_ref().map(|bearer| bearer.expose()), Some("ya29.recorded"));

	let OutboundBody::Json(payload) = &send.body else {
		panic!("Send body should be JSON.");
	};

	assert_eq!(
		serde_json::from_slice::<serde_json::Value>(payload).expect("Payload should be JSON."),
		common::send_payload("tokA")
	);
}

#[tokio::test]
async fn transport_failures_are_isolated_per_recipient() {
	let client = Arc::new(RecordingClient { fail_sends: true, ..Default::default() });
	let relay = relay(client.clone()).with_dispatch_concurrency(3);
	let result = relay.send_batch(&common::batch(&["tokA", "tokB", "tokC"])).await;

	assert_eq!(result.http_status(), 200);
	assert_eq!(result.outcomes().len(), 3);

	for outcome in result.outcomes() {
		assert_eq!(outcome.status, 0);
		assert!(outcome.body.contains("deadline elapsed"));
	}

	assert_eq!(client.requests.lock().len(), 4);
}

#[tokio::test]
async fn every_batch_signs_a_fresh_assertion() {
	let client = Arc::new(RecordingClient::default());
	let relay = relay(client.clone());
	let request = common::batch(&["tokA"]);

	relay.send_batch(&request).await;
	relay.send_batch(&request).await;

	let exchanges = client
		.requests
		.lock()
		.iter()
		.filter(|request| request.form_value("grant_type").is_some())
		.count();

	assert_eq!(exchanges, 2);
}

#[tokio::test]
async fn truncated_reply_keeps_the_received_status() {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Listener should bind.");
	let addr = listener.local_addr().expect("Listener should expose its address.");
	let server = tokio::spawn(async move {
		let (mut socket, _) = listener.accept().await.expect("Client should connect.");
		let mut received = Vec::new();
		let mut chunk = [0_u8; 1024];

		while !received.ends_with(b"{}") {
			let read = socket.read(&mut chunk).await.expect("Request should be readable.");

			if read == 0 {
				break;
			}

			received.extend_from_slice(&chunk[..read]);
		}

		socket
			.write_all(
				b"HTTP/1.1 404 Not Found\r\nContent-Type: application/json\r\nContent-Length: 500\r\n\r\n{\"error\":",
			)
			.await
			.expect("Partial reply should be written.");
		socket.shutdown().await.expect("Socket should shut down.");
	});
	let client = ReqwestHttpClient::with_timeout(std::time::Duration::from_secs(5))
		.expect("Client should build.");
	let url = Url::parse(&format!("http://{addr}/v1/projects/demo/messages:send"))
		.expect("Local URL should parse.");
	let reply = client
		.execute(OutboundRequest::json(url, Secret::new("ya29.local"), b"{}".to_vec()))
		.await
		.expect("A received status line should resolve as a reply.");

	assert_eq!(reply.status, 404);
	assert!(reply.body.contains("Network error occurred while calling"));

	server.await.expect("Server task should finish.");
}
