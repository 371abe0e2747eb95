//! `fcm-relay` binary: load configuration, then serve until interrupted.

// std
use std::process::ExitCode;
// self
use fcm_relay::server;

#[tokio::main]
async fn main() -> ExitCode {
	server::init_tracing();

	let result = match server::load_config() {
		Ok(config) => server::serve(config).await,
		Err(e) => Err(e.into()),
	};

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			tracing::error!(error = %e.diagnostic(), "FCM relay stopped.");

			ExitCode::FAILURE
		},
	}
}
