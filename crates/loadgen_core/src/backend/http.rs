//! Blocking HTTP client for the dispatch API.
//!
//! Every request is a JSON `POST` carrying the admin credentials alongside the
//! operation's fields. Responses share one envelope (see [`parser`]).

mod parser;

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{BackendError, CreateOrderRequest, DispatchBackend};
use crate::orders::OrderId;
use crate::riders::Rider;
use parser::{parse_ack, parse_order_created, parse_user_lookup, UserLookup};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Admin credentials sent with every call.
#[derive(Debug, Clone, Default)]
pub struct ApiCredentials {
    pub token: String,
    pub user_hash: String,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    credentials: ApiCredentials,
}

impl HttpBackend {
    /// Create a client for `base_url` (e.g. `https://dispatch.example.com/api/v1`).
    pub fn new(base_url: &str, credentials: ApiCredentials) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn post(&self, path: &str, fields: Value) -> Result<String, BackendError> {
        let mut body = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert("token".to_string(), json!(self.credentials.token));
        body.insert("u_hash".to_string(), json!(self.credentials.user_hash));

        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "dispatch api request");
        let response = self.client.post(&url).json(&body).send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(BackendError::Rejected {
                operation: path.to_string(),
                payload: format!("HTTP {status}: {text}"),
            });
        }
        Ok(text)
    }

    fn lookup_user(&self, email: &str) -> Result<UserLookup, BackendError> {
        let body = self.post("user/get", json!({ "email": email }))?;
        parse_user_lookup(&body)
    }
}

impl DispatchBackend for HttpBackend {
    fn register_or_use_rider(
        &mut self,
        email: &str,
        display_name: &str,
    ) -> Result<Rider, BackendError> {
        if let UserLookup::Found(rider) = self.lookup_user(email)? {
            return Ok(rider);
        }

        let body = self.post(
            "user/register",
            json!({ "email": email, "name": display_name }),
        )?;
        parse_ack("user/register", &body)?;
        info!(email, "rider registered");

        match self.lookup_user(email)? {
            UserLookup::Found(rider) => Ok(rider),
            UserLookup::NotFound => Err(BackendError::Malformed {
                operation: "user/get".to_string(),
                reason: format!("{email} still unknown after registration"),
            }),
        }
    }

    fn create_order(&mut self, request: &CreateOrderRequest) -> Result<OrderId, BackendError> {
        let body = self.post(
            "drive",
            json!({
                "u_id": request.rider_id.0,
                "b_start_latitude": request.origin.lat,
                "b_start_longitude": request.origin.lon,
                "b_destination_latitude": request.destination.lat,
                "b_destination_longitude": request.destination.lon,
                "b_start_datetime": request.start_time,
                "b_max_waiting": request.lifetime_secs,
                "b_passengers_count": request.passenger_count,
                "b_services": request.service_tags,
            }),
        )?;
        parse_order_created(&body)
    }

    fn cancel_order(&mut self, order_id: &OrderId, reason: &str) -> Result<(), BackendError> {
        let path = format!("drive/get/{order_id}/cancel");
        let body = self.post(&path, json!({ "reason": reason }))?;
        parse_ack(&path, &body)
    }
}
