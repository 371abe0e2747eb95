//! Per-recipient fan-out against the FCM v1 send endpoint.

// crates.io
use futures::{StreamExt, stream};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ProjectId},
	http::{OutboundRequest, RelayHttpClient},
	obs::{self, DeliveryOutcome, Stage, StageOutcome, StageSpan},
	relay::{NotificationRequest, Relay},
};

/// Raw provider answer for one recipient.
///
/// The status and body pass through uninterpreted. A status of
/// [`DispatchOutcome::UNREACHABLE`] means no HTTP response was obtained and `body` holds the
/// transport error chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
	/// HTTP status returned by FCM, or `0` when the call never got a response.
	pub status: u16,
	/// Raw response body.
	pub body: String,
}
impl DispatchOutcome {
	/// Sentinel status for connection-level failures.
	pub const UNREACHABLE: u16 = 0;

	/// Records a failure that produced no HTTP response.
	pub fn unreachable(error: &(dyn StdError + 'static)) -> Self {
		Self { status: Self::UNREACHABLE, body: crate::error::flatten_chain(error) }
	}

	/// Delivery classification of this outcome.
	pub fn delivery(&self) -> DeliveryOutcome {
		DeliveryOutcome::from_status(self.status)
	}
}

#[derive(Serialize)]
struct SendPayload<'a> {
	message: Message<'a>,
}
#[derive(Serialize)]
struct Message<'a> {
	token: &'a str,
	notification: Notification<'a>,
}
#[derive(Serialize)]
struct Notification<'a> {
	title: &'a str,
	body: &'a str,
}

impl<C> Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// Sends one message per recipient and returns the outcomes in input order.
	///
	/// At most `dispatch_concurrency` sends are in flight. A failure for one recipient never
	/// affects another; the only error is an unusable send endpoint, raised before any call.
	pub async fn dispatch(
		&self,
		token: &AccessToken,
		project: &ProjectId,
		request: &NotificationRequest,
	) -> Result<Vec<DispatchOutcome>> {
		let endpoint = self.descriptor.send_endpoint(project)?;
		let span = StageSpan::new(Stage::Dispatch);
		let sends = request
			.tokens
			.iter()
			.enumerate()
			.map(|(index, recipient)| {
				self.send_one(index, &endpoint, token, recipient, &request.title, &request.body)
			})
			.collect::<Vec<_>>();
		let outcomes = span
			.instrument(
				stream::iter(sends).buffered(self.dispatch_concurrency().max(1)).collect::<Vec<_>>(),
			)
			.await;
		let delivered = outcomes.iter().filter(|o| o.delivery() == DeliveryOutcome::Delivered).count();

		obs::record_stage_outcome(Stage::Dispatch, StageOutcome::Success);
		tracing::info!(recipients = outcomes.len(), delivered, "Batch dispatched.");

		Ok(outcomes)
	}

	async fn send_one(
		&self,
		index: usize,
		endpoint: &Url,
		token: &AccessToken,
		recipient: &str,
		title: &str,
		body: &str,
	) -> DispatchOutcome {
		let payload =
			SendPayload { message: Message { token: recipient, notification: Notification { title, body } } };
		let outcome = match serde_json::to_vec(&payload) {
			Ok(payload) => {
				let request = OutboundRequest::json(endpoint.clone(), token.secret.clone(), payload);

				match self.http_client.execute(request).await {
					Ok(reply) => DispatchOutcome { status: reply.status, body: reply.body },
					Err(e) => DispatchOutcome::unreachable(&e),
				}
			},
			Err(e) => DispatchOutcome::unreachable(&e),
		};
		let delivery = outcome.delivery();

		match delivery {
			DeliveryOutcome::Delivered => {},
			DeliveryOutcome::Rejected =>
				tracing::warn!(index, status = outcome.status, "Recipient send was rejected."),
			DeliveryOutcome::Unreachable =>
				tracing::warn!(index, error = %outcome.body, "Recipient send got no response."),
		}

		obs::record_delivery_outcome(delivery);

		outcome
	}
}
