use serde::Deserialize;
use serde_json::Value;

use crate::backend::BackendError;
use crate::orders::OrderId;
use crate::riders::{Rider, RiderId};

const USER_NOT_FOUND: &str = "user not found";

/// Common response envelope of the dispatch API.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    status: String,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    auth_user: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    u_id: Value,
    u_name: String,
    u_email: String,
}

#[derive(Debug, PartialEq)]
pub(super) enum UserLookup {
    Found(Rider),
    NotFound,
}

fn envelope(operation: &str, body: &str) -> Result<ApiEnvelope, BackendError> {
    serde_json::from_str(body).map_err(|err| BackendError::Malformed {
        operation: operation.to_string(),
        reason: format!("{err}; body: {body}"),
    })
}

fn rejected(operation: &str, body: &str) -> BackendError {
    BackendError::Rejected {
        operation: operation.to_string(),
        payload: body.to_string(),
    }
}

/// Ids arrive as JSON numbers or strings; both become opaque strings.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_user_not_found(message: Option<&Value>) -> bool {
    match message {
        Some(Value::Object(map)) => map.get("error").and_then(Value::as_str) == Some(USER_NOT_FOUND),
        Some(Value::String(s)) => s == USER_NOT_FOUND,
        _ => false,
    }
}

pub(super) fn parse_user_lookup(body: &str) -> Result<UserLookup, BackendError> {
    const OP: &str = "user/get";
    let env = envelope(OP, body)?;
    match env.status.as_str() {
        "success" => {
            let user = env.auth_user.ok_or_else(|| BackendError::Malformed {
                operation: OP.to_string(),
                reason: format!("missing auth_user; body: {body}"),
            })?;
            let id = id_string(&user.u_id).ok_or_else(|| BackendError::Malformed {
                operation: OP.to_string(),
                reason: format!("unusable u_id {}", user.u_id),
            })?;
            Ok(UserLookup::Found(Rider {
                id: RiderId(id),
                display_name: user.u_name,
                contact: user.u_email,
            }))
        }
        "error" if is_user_not_found(env.message.as_ref()) => Ok(UserLookup::NotFound),
        _ => Err(rejected(OP, body)),
    }
}

pub(super) fn parse_order_created(body: &str) -> Result<OrderId, BackendError> {
    const OP: &str = "drive";
    let env = envelope(OP, body)?;
    if env.status != "success" {
        return Err(rejected(OP, body));
    }
    env.data
        .as_ref()
        .and_then(|data| data.get("b_id"))
        .and_then(id_string)
        .map(OrderId)
        .ok_or_else(|| BackendError::Malformed {
            operation: OP.to_string(),
            reason: format!("missing data.b_id; body: {body}"),
        })
}

pub(super) fn parse_ack(operation: &str, body: &str) -> Result<(), BackendError> {
    let env = envelope(operation, body)?;
    if env.status == "success" {
        Ok(())
    } else {
        Err(rejected(operation, body))
    }
}
