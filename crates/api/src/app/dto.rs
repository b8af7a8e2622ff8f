use core::str::FromStr;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use coursedesk_auth::{Action, Grant, GrantFlags, NavNode};
use coursedesk_core::{CredentialId, DomainError, UserId};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub operation: String,
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct SetGrantRequest {
    pub resource_id: String,
    pub group_id: String,
    #[serde(flatten)]
    pub flags: GrantFlags,
}

impl SetGrantRequest {
    pub fn into_grant(self) -> Result<Grant, axum::response::Response> {
        Ok(Grant {
            resource_id: parse_id(&self.resource_id, "resource_id")?,
            group_id: parse_id(&self.group_id, "group_id")?,
            flags: self.flags,
        })
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub allowed: bool,
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: UserId,
    pub credential_id: CredentialId,
}

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub items: Vec<NavNode>,
}

#[derive(Debug, Serialize)]
pub struct DeactivatedResponse {
    pub user_id: UserId,
    pub credentials_revoked: u64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub grants_dropped: u64,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_id<T>(raw: &str, field: &'static str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.trim()
        .parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {field}")))
}

pub fn parse_action(raw: &str) -> Result<Action, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_action",
            "action must be one of: view, create, edit, delete, upload",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursedesk_core::{GroupId, ResourceNodeId};

    #[test]
    fn set_grant_request_defaults_missing_flags_to_false() {
        let body = serde_json::json!({
            "resource_id": ResourceNodeId::new().to_string(),
            "group_id": GroupId::new().to_string(),
            "can_view": true,
        });
        let req: SetGrantRequest = serde_json::from_value(body).unwrap();
        let grant = req.into_grant().unwrap();
        assert_eq!(grant.flags, GrantFlags::only(&[Action::View]));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let req = SetGrantRequest {
            resource_id: "not-a-uuid".to_string(),
            group_id: GroupId::new().to_string(),
            flags: GrantFlags::ALL,
        };
        let response = req.into_grant().unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn actions_parse_or_fail_with_bad_request() {
        assert_eq!(parse_action("Edit").unwrap(), Action::Edit);
        assert_eq!(parse_action("approve").unwrap_err().status(), StatusCode::BAD_REQUEST);
    }
}
