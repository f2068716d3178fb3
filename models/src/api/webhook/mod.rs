use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The only event that the webhook acts upon. Every other event is
/// acknowledged and ignored.
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

/// The body of `POST /polka/webhooks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolkaWebhookRequest {
	/// The name of the event, such as `user.upgraded`
	pub event: String,
	/// Details about the event
	#[serde(default)]
	pub data: PolkaWebhookData,
}

/// Details about a webhook event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolkaWebhookData {
	/// The user the event is about
	#[serde(default)]
	pub user_id: Option<Uuid>,
}

impl PolkaWebhookRequest {
	/// Whether this event upgrades a user to Chirpy Red
	pub fn is_user_upgrade(&self) -> bool {
		self.event == USER_UPGRADED_EVENT
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_events_without_data_still_parse() {
		let request: PolkaWebhookRequest =
			serde_json::from_str(r#"{"event":"user.payment_failed"}"#).unwrap();
		assert!(!request.is_user_upgrade());
		assert_eq!(request.data.user_id, None);
	}

	#[test]
	fn upgrade_event_carries_the_user() {
		let request: PolkaWebhookRequest = serde_json::from_str(
			r#"{"event":"user.upgraded","data":{"user_id":"3311741c-680c-4546-99f3-fc9efac2036c"}}"#,
		)
		.unwrap();
		assert!(request.is_user_upgrade());
		assert_eq!(
			request.data.user_id,
			Some(Uuid::parse_str("3311741c-680c-4546-99f3-fc9efac2036c").unwrap())
		);
	}
}
