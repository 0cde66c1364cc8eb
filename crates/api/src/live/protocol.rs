//! Live channel wire format.

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use storefront_auth::Role;
use storefront_core::FeedbackId;

const NOT_AUTHORIZED: &str = "Для отправки отзывов необходимо авторизоваться";

/// A well-formed request from a peer, already checked against its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    CreateFeedback {
        liked_text: String,
        disliked_text: String,
    },
    UpdateComment {
        feedback_id: FeedbackId,
        admin_comment: String,
    },
    DeleteFeedback {
        feedback_id: FeedbackId,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("message tagged '{declared}' on a '{actual}' connection")]
    RoleMismatch { declared: Role, actual: Role },

    #[error("guests cannot send messages")]
    GuestInput,

    #[error("binary frames are not supported")]
    Binary,
}

#[derive(Deserialize)]
struct Envelope {
    role: Role,
    #[serde(default)]
    operation_type: Option<String>,
}

#[derive(Deserialize)]
struct CreateBody {
    liked_text: String,
    disliked_text: String,
}

#[derive(Deserialize)]
struct UpdateBody {
    feedback_id: FeedbackId,
    admin_comment: String,
}

#[derive(Deserialize)]
struct DeleteBody {
    feedback_id: FeedbackId,
}

/// Parse a text frame received on a connection held by `connection_role`.
///
/// The message's `role` tag must match the connection: users may only
/// create feedback, admins may only update or delete it.
pub fn parse_inbound(text: &str, connection_role: Role) -> Result<Inbound, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    let envelope: Envelope = body(&value)?;

    if envelope.role != connection_role {
        return Err(ProtocolError::RoleMismatch {
            declared: envelope.role,
            actual: connection_role,
        });
    }

    match connection_role {
        Role::Guest => Err(ProtocolError::GuestInput),
        Role::User => {
            let CreateBody {
                liked_text,
                disliked_text,
            } = body(&value)?;
            Ok(Inbound::CreateFeedback {
                liked_text,
                disliked_text,
            })
        }
        Role::Admin => match envelope.operation_type.as_deref() {
            Some("update") => {
                let UpdateBody {
                    feedback_id,
                    admin_comment,
                } = body(&value)?;
                Ok(Inbound::UpdateComment {
                    feedback_id,
                    admin_comment,
                })
            }
            Some("delete") => {
                let DeleteBody { feedback_id } = body(&value)?;
                Ok(Inbound::DeleteFeedback { feedback_id })
            }
            Some(other) => Err(ProtocolError::UnknownOperation(other.to_string())),
            None => Err(ProtocolError::Malformed("missing operation_type".into())),
        },
    }
}

fn body<T: for<'de> Deserialize<'de>>(value: &Value) -> Result<T, ProtocolError> {
    T::deserialize(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Everything the server pushes to a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Created { feedback_html: String },
    Updated {
        feedback_id: FeedbackId,
        admin_comment: String,
    },
    Deleted { feedback_id: FeedbackId },
    NotAuthorized,
    InvalidValue,
    FeedbackNotFound,
    ServerError,
}

impl Outbound {
    pub fn to_json(&self) -> Value {
        match self {
            Outbound::Created { feedback_html } => json!({
                "status_code": 200,
                "operation_type": "create",
                "feedback_html": feedback_html,
            }),
            Outbound::Updated {
                feedback_id,
                admin_comment,
            } => json!({
                "status_code": 200,
                "operation_type": "update",
                "feedback_id": feedback_id,
                "admin_comment": admin_comment,
            }),
            Outbound::Deleted { feedback_id } => json!({
                "status_code": 200,
                "operation_type": "delete",
                "feedback_id": feedback_id,
            }),
            Outbound::NotAuthorized => json!({
                "status_code": 401,
                "error_message": NOT_AUTHORIZED,
            }),
            Outbound::InvalidValue => json!({
                "status_code": 400,
                "error_message": "Invalid value",
            }),
            Outbound::FeedbackNotFound => json!({
                "status_code": 404,
                "error_message": "Feedback not found",
            }),
            Outbound::ServerError => json!({
                "status_code": 500,
                "error_message": "Server error",
            }),
        }
    }

    pub fn to_text(&self) -> String {
        self.to_json().to_string()
    }
}
