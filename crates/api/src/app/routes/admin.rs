//! Permission administration.
//!
//! Each endpoint is guarded by its own logical operation, so access to the
//! admin surface is itself governed by the grant matrix.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post, put},
};

use coursedesk_auth::Action;
use coursedesk_core::{GroupId, ResourceNodeId, UserId};

use crate::app::{
    dto::{self, DeactivatedResponse, DeletedResponse, SetGrantRequest},
    errors,
    services::AppServices,
};
use crate::authz;
use crate::context::RequestIdentity;

pub const OP_PERMISSIONS_UPDATE: &str = "permissions.update";
pub const OP_USERS_UPDATE: &str = "users.update";
pub const OP_MENUS_DESTROY: &str = "menus.destroy";
pub const OP_GROUPS_DESTROY: &str = "groups.destroy";

// -------------------------
// Router
// -------------------------

pub fn router() -> Router {
    Router::new()
        .route("/grants", put(set_grant))
        .route("/grants/:resource_id/:group_id", delete(remove_grant))
        .route("/users/:id/deactivate", post(deactivate_user))
        .route("/users/:id/activate", post(activate_user))
        .route("/resources/:id", delete(delete_resource))
        .route("/groups/:id", delete(delete_group))
}

// -------------------------
// Handlers
// -------------------------

/// PUT /admin/grants - Insert or replace one matrix cell
pub async fn set_grant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Json(body): Json<SetGrantRequest>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &identity, OP_PERMISSIONS_UPDATE, Action::Edit).await {
        return denied;
    }

    let grant = match body.into_grant() {
        Ok(grant) => grant,
        Err(response) => return response,
    };

    match services.admin.set_grant(grant).await {
        Ok(()) => (StatusCode::OK, Json(grant)).into_response(),
        Err(e) => errors::admin_error_to_response(e),
    }
}

/// DELETE /admin/grants/:resource_id/:group_id - Remove one matrix cell
pub async fn remove_grant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path((resource_id, group_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &identity, OP_PERMISSIONS_UPDATE, Action::Delete).await {
        return denied;
    }

    let resource_id: ResourceNodeId = match dto::parse_id(&resource_id, "resource_id") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let group_id: GroupId = match dto::parse_id(&group_id, "group_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.admin.remove_grant(resource_id, group_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "grant not found"),
        Err(e) => errors::admin_error_to_response(e),
    }
}

/// POST /admin/users/:id/deactivate - Deactivate and revoke every credential
pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &identity, OP_USERS_UPDATE, Action::Edit).await {
        return denied;
    }

    let user_id: UserId = match dto::parse_id(&id, "user id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.admin.deactivate_user(user_id).await {
        Ok(credentials_revoked) => (
            StatusCode::OK,
            Json(DeactivatedResponse {
                user_id,
                credentials_revoked,
            }),
        )
            .into_response(),
        Err(e) => errors::admin_error_to_response(e),
    }
}

/// POST /admin/users/:id/activate
pub async fn activate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &identity, OP_USERS_UPDATE, Action::Edit).await {
        return denied;
    }

    let user_id: UserId = match dto::parse_id(&id, "user id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.admin.activate_user(user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::admin_error_to_response(e),
    }
}

/// DELETE /admin/resources/:id - Delete a leaf node and its grants
pub async fn delete_resource(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &identity, OP_MENUS_DESTROY, Action::Delete).await {
        return denied;
    }

    let resource_id: ResourceNodeId = match dto::parse_id(&id, "resource_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.admin.delete_resource(resource_id).await {
        Ok(grants_dropped) => (StatusCode::OK, Json(DeletedResponse { grants_dropped })).into_response(),
        Err(e) => errors::admin_error_to_response(e),
    }
}

/// DELETE /admin/groups/:id - Delete an unused group and its grants
pub async fn delete_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&services, &identity, OP_GROUPS_DESTROY, Action::Delete).await {
        return denied;
    }

    let group_id: GroupId = match dto::parse_id(&id, "group_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.admin.delete_group(group_id).await {
        Ok(grants_dropped) => (StatusCode::OK, Json(DeletedResponse { grants_dropped })).into_response(),
        Err(e) => errors::admin_error_to_response(e),
    }
}
