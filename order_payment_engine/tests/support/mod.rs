#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use log::*;
use opg_common::Cents;
use order_payment_engine::{
    db_types::{OrderId, User},
    traits::{GatewayError, GatewayEvent, PaymentCredentials, PaymentGateway},
    SqliteDatabase,
};
use serde_json::{json, Value};

pub const VALID_SIGNATURE: &str = "valid";

/// A fresh database in the temp directory, seeded with two customers and an administrator.
pub async fn new_database() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/opg_it_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database");
    for (id, name, role) in [("user-alice", "Alice", "USER"), ("user-bob", "Bob", "USER"), ("admin-1", "Admin", "ADMIN")]
    {
        let user = User { id: id.into(), name: name.into(), email: format!("{}@example.com", name.to_lowercase()), role: role.into() };
        db.upsert_user(&user).await.expect("Error seeding users");
    }
    debug!("🚀️ Test database ready at {url}");
    db
}

#[derive(Debug, Default)]
struct GatewayState {
    fail: bool,
    intents: Vec<(OrderId, Cents, String)>,
}

/// A payment gateway that records the intents it is asked to open and accepts events signed with
/// [`VALID_SIGNATURE`].
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl FakeGateway {
    pub fn failing() -> Self {
        let gateway = Self::default();
        gateway.state.lock().unwrap().fail = true;
        gateway
    }

    pub fn intents(&self) -> Vec<(OrderId, Cents, String)> {
        self.state.lock().unwrap().intents.clone()
    }

    pub fn intent_id_for(order_id: &OrderId) -> String {
        format!("pi_{order_id}")
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_intent(
        &self,
        order_id: &OrderId,
        amount: Cents,
        owner_id: &str,
    ) -> Result<PaymentCredentials, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(GatewayError::Unavailable("connection refused".into()));
        }
        state.intents.push((order_id.clone(), amount, owner_id.to_string()));
        let payment_intent_id = Self::intent_id_for(order_id);
        Ok(PaymentCredentials { client_secret: format!("{payment_intent_id}_secret"), payment_intent_id })
    }

    fn construct_event(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError> {
        if signature != VALID_SIGNATURE {
            return Err(GatewayError::SignatureInvalid("No signatures found matching the expected signature".into()));
        }
        let value: Value = serde_json::from_slice(payload).map_err(|e| GatewayError::MalformedEvent(e.to_string()))?;
        let event_id = value["id"].as_str().unwrap_or_default().to_string();
        let event_type = value["type"].as_str().unwrap_or_default().to_string();
        let intent_id = value["data"]["object"]["id"].as_str().unwrap_or_default().to_string();
        Ok(match event_type.as_str() {
            "payment_intent.succeeded" => GatewayEvent::PaymentSucceeded { event_id, intent_id },
            "payment_intent.payment_failed" => GatewayEvent::PaymentFailed { event_id, intent_id },
            _ => GatewayEvent::Unrecognized { event_id, event_type },
        })
    }
}

pub fn event_payload(event_type: &str, intent_id: &str) -> Vec<u8> {
    let event = json!({
        "id": format!("evt_{}", rand::random::<u32>()),
        "type": event_type,
        "data": { "object": { "id": intent_id, "object": "payment_intent" } }
    });
    serde_json::to_vec(&event).unwrap()
}
