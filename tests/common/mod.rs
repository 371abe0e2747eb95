#![allow(dead_code)]

// crates.io
use httpmock::prelude::*;
// self
use fcm_relay::{
	auth::{ClientEmail, ProjectId, ServiceAccountCredential},
	http::ReqwestHttpClient,
	provider::ProviderDescriptor,
	reqwest::{Client as ReqwestClient, redirect::Policy},
	relay::{NotificationRequest, Relay, ReqwestRelay},
	url::Url,
};

pub const KEY_PEM: &str = include_str!("../fixtures/service_account_key.pem");
pub const CLIENT_EMAIL: &str = "relay@demo-project.iam.gserviceaccount.com";
pub const PROJECT_ID: &str = "demo-project";
pub const SEND_PATH: &str = "/v1/projects/demo-project/messages:send";
pub const BEARER: &str = "ya29.mock-bearer";

pub fn credential_with_key(private_key: &str) -> ServiceAccountCredential {
	ServiceAccountCredential::new(
		ClientEmail::new(CLIENT_EMAIL).expect("Fixture email should be valid."),
		private_key,
		ProjectId::new(PROJECT_ID).expect("Fixture project should be valid."),
	)
}

pub fn credential() -> ServiceAccountCredential {
	credential_with_key(KEY_PEM)
}

pub fn descriptor(server: &MockServer) -> ProviderDescriptor {
	ProviderDescriptor::builder()
		.token_endpoint(
			Url::parse(&server.url("/token")).expect("Mock token endpoint should parse."),
		)
		.messaging_endpoint(
			Url::parse(&server.base_url()).expect("Mock messaging endpoint should parse."),
		)
		.build()
		.expect("Mock descriptor should validate.")
}

/// Builds a reqwest client that accepts the self-signed certificates served by `httpmock`.
pub fn test_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.timeout(std::time::Duration::from_secs(5))
		.build()
		.expect("Insecure test client should build.");

	ReqwestHttpClient::with_client(client)
}

pub fn relay_with(
	credential: ServiceAccountCredential,
	descriptor: ProviderDescriptor,
) -> ReqwestRelay {
	Relay::with_http_client(credential, descriptor, test_http_client())
}

pub fn relay(server: &MockServer) -> ReqwestRelay {
	relay_with(credential(), descriptor(server))
}

pub fn batch(tokens: &[&str]) -> NotificationRequest {
	NotificationRequest::new(tokens.iter().copied(), "Hi", "There")
		.expect("Fixture batch should be valid.")
}

pub fn send_payload(token: &str) -> serde_json::Value {
	serde_json::json!({
		"message": { "token": token, "notification": { "title": "Hi", "body": "There" } },
	})
}

pub async fn mock_token_endpoint(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"{BEARER}\",\"expires_in\":3599,\"token_type\":\"Bearer\"}}"
			));
		})
		.await
}

pub async fn mock_send<'a>(
	server: &'a MockServer,
	token: &str,
	status: u16,
	body: &str,
) -> httpmock::Mock<'a> {
	let payload = send_payload(token);
	let authorization = format!("Bearer {BEARER}");
	let body = body.to_owned();

	server
		.mock_async(move |when, then| {
			when.method(POST)
				.path(SEND_PATH)
				.header("authorization", authorization.as_str())
				.header("content-type", "application/json")
				.json_body(payload.clone());
			then.status(status).header("content-type", "application/json").body(body.clone());
		})
		.await
}
