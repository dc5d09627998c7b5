//! Send and verification endpoints
//!
//! `POST` sends a text or media message to one number, one group, or a list
//! of numbers. `GET` answers the subscription verification handshake.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiState;
use crate::Error;
use crate::messaging::{
    BulkSummary, MediaRef, PartialSendOptions, SendDirective, SendResult, SentNotification, Target,
};

/// Successful send response
#[derive(Serialize)]
pub struct SendResponse<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub details: String,
}

/// Send endpoint errors
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: String,
}

impl ApiError {
    fn bad_request(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid request".to_string(),
            details: details.into(),
        }
    }

    fn send_failed(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Failed to send message".to_string(),
            details: details.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(details) => Self::bad_request(details),
            Error::ClientNotReady => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: err.to_string(),
                details: "Client is still initializing. Please wait and try again.".to_string(),
            },
            other => Self::send_failed(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                success: false,
                error: self.error,
                details: self.details,
            }),
        )
            .into_response()
    }
}

/// Where a send request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    One(Target),
    Many(Vec<Target>),
}

/// A validated send request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPlan {
    pub recipients: Recipients,
    pub directive: SendDirective,
}

impl SendPlan {
    /// Validate a request body
    ///
    /// # Errors
    ///
    /// Returns `Validation` naming the first missing or malformed field
    pub fn from_body(body: &Value) -> crate::Result<Self> {
        let Value::Object(fields) = body else {
            return Err(Error::Validation("request body must be a JSON object".to_string()));
        };

        let text_field = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let message_type = text_field("messageType");
        let phone_number = fields.get("phoneNumber").and_then(identifier);
        let group_id = fields.get("groupId").and_then(identifier);
        let phone_numbers = match fields.get("phoneNumbers") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => {
                let numbers: Option<Vec<String>> = items.iter().map(identifier).collect();
                Some(numbers.ok_or_else(|| {
                    Error::Validation("phoneNumbers must contain only non-empty numbers".to_string())
                })?)
            }
            Some(_) => {
                return Err(Error::Validation("phoneNumbers must be an array".to_string()));
            }
        };

        let recipients = match (message_type.as_deref(), phone_numbers, group_id, phone_number) {
            (Some(kind), _, _, _) if !matches!(kind, "text" | "media" | "group" | "bulk") => {
                return Err(Error::Validation(format!("unknown messageType: {kind}")));
            }
            (_, Some(numbers), _, _) => {
                if numbers.is_empty() {
                    return Err(Error::Validation("phoneNumbers must not be empty".to_string()));
                }
                Recipients::Many(numbers.into_iter().map(Target::individual).collect())
            }
            (Some("bulk"), None, _, _) => {
                return Err(Error::Validation("phoneNumbers is required for bulk sends".to_string()));
            }
            (_, None, Some(group), _) => Recipients::One(Target::group(group)),
            (Some("group"), None, None, Some(number)) => Recipients::One(Target::group(number)),
            (_, None, None, Some(number)) => Recipients::One(Target::individual(number)),
            (_, None, None, None) => {
                return Err(Error::Validation(
                    "phoneNumber, groupId or phoneNumbers is required".to_string(),
                ));
            }
        };

        let message = text_field("message");
        let media_url = text_field("mediaUrl").filter(|_| message_type.as_deref() == Some("media"));
        let options = fields
            .get("options")
            .map(PartialSendOptions::from_value)
            .unwrap_or_default();

        let directive = match (media_url, message) {
            (Some(url), message) => SendDirective::media(MediaRef::parse(&url), message, &options),
            (None, Some(message)) => SendDirective::text(message, &options),
            (None, None) if message_type.as_deref() == Some("media") => {
                return Err(Error::Validation("mediaUrl is required for media sends".to_string()));
            }
            (None, None) => {
                return Err(Error::Validation("message is required".to_string()));
            }
        };

        Ok(Self {
            recipients,
            directive,
        })
    }
}

/// A phone number or group id given as a string or a bare number
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Handle a send request
async fn send_message(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let plan = SendPlan::from_body(&body)?;

    if !state.dispatcher.is_ready() {
        return Err(Error::ClientNotReady.into());
    }

    match plan.recipients {
        Recipients::One(target) => {
            tracing::debug!(target = %target, kind = plan.directive.kind.as_str(), "send requested");
            let result = state.dispatcher.send(&target, &plan.directive).await?;

            if state.forward_sent_events {
                state
                    .forwarder
                    .forward_detached(SentNotification::new(result.clone(), state.dispatcher.is_ready()));
            }

            match result {
                SendResult::Ok(_) => Ok(Json(SendResponse {
                    success: true,
                    message: "Message sent successfully",
                    data: result,
                })
                .into_response()),
                SendResult::Failed(failure) => Err(ApiError::send_failed(failure.error)),
            }
        }
        Recipients::Many(targets) => {
            tracing::debug!(count = targets.len(), "bulk send requested");
            let results = state.bulk.send_bulk(&targets, &plan.directive).await;
            Ok(Json(SendResponse {
                success: true,
                message: "Bulk send complete",
                data: BulkSummary::from(results),
            })
            .into_response())
        }
    }
}

/// Verification query parameters
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub verify_token: Option<String>,
    pub challenge: Option<String>,
}

/// Echo the challenge if the token matches
async fn verify(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<VerifyQuery>,
) -> (StatusCode, String) {
    if query.verify_token.as_deref() == Some(state.verify_token.as_str()) {
        (StatusCode::OK, query.challenge.unwrap_or_default())
    } else {
        tracing::warn!("webhook verification failed");
        (StatusCode::FORBIDDEN, "Verification token mismatch".to_string())
    }
}

/// Build the webhook router at `path`
pub fn router(state: Arc<ApiState>, path: &str) -> Router {
    Router::new()
        .route(path, get(verify).post(send_message))
        .with_state(state)
}
