//! Role-permission relation handlers: single pairs, bulk changes and grouped views.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::Json,
};
use sqlx::PgPool;
use tracing::info;

use super::{
    assignment::{bulk_assign, list_role_permissions, list_with_assignment_state},
    error::AssignmentError,
    storage::{
        delete_assignment, fetch_assignment, fetch_assignments, insert_assignment,
        permission_exists, role_exists,
    },
    types::{
        AssignRequest, AssignmentEnvelope, AssignmentList, BulkAssignRequest, BulkAssignResponse,
        GroupedPermissions, MessageResponse,
    },
};
use crate::api::handlers::ErrorBody;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AssignmentError> {
    payload
        .map(|Json(body)| body)
        .map_err(|err| AssignmentError::Validation(err.body_text()))
}

#[utoipa::path(
    get,
    path = "/api/protected/role-permissions",
    responses(
        (status = 200, description = "Every role-permission pair.", body = AssignmentList),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
pub async fn list_assignments(
    pool: Extension<PgPool>,
) -> Result<Json<AssignmentList>, AssignmentError> {
    let assignments = fetch_assignments(&pool).await?;
    Ok(Json(AssignmentList {
        message: "Relaciones rol-permiso obtenidas exitosamente".to_string(),
        assignments,
    }))
}

#[utoipa::path(
    post,
    path = "/api/protected/role-permissions",
    request_body = AssignRequest,
    responses(
        (status = 201, description = "Pair created.", body = AssignmentEnvelope),
        (status = 200, description = "Pair already existed; nothing written.", body = AssignmentEnvelope),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Role or permission not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
/// Assigns one permission to one role. Repeating the call is a no-op reported via `already_assigned`.
pub async fn assign(
    pool: Extension<PgPool>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssignmentEnvelope>), AssignmentError> {
    let request = body(payload)?;

    if !role_exists(&pool, request.role_id).await? {
        return Err(AssignmentError::RoleNotFound(request.role_id));
    }
    if !permission_exists(&pool, request.permission_id).await? {
        return Err(AssignmentError::PermissionNotFound(request.permission_id));
    }

    let inserted = insert_assignment(&pool, request.role_id, request.permission_id).await?;
    let assignment = fetch_assignment(&pool, request.role_id, request.permission_id)
        .await?
        .ok_or(AssignmentError::AssignmentNotFound {
            role_id: request.role_id,
            permission_id: request.permission_id,
        })?;

    let (status, message) = if inserted {
        (StatusCode::CREATED, "Relación rol-permiso creada exitosamente")
    } else {
        (StatusCode::OK, "El rol ya tiene asignado este permiso")
    };

    Ok((
        status,
        Json(AssignmentEnvelope {
            message: message.to_string(),
            assignment,
            already_assigned: !inserted,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/protected/role-permissions/{role_id}/{permission_id}",
    params(
        ("role_id" = i64, Path, description = "Role id"),
        ("permission_id" = i64, Path, description = "Permission id"),
    ),
    responses(
        (status = 200, description = "The pair.", body = AssignmentEnvelope),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Pair not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
pub async fn get_assignment(
    Path((role_id, permission_id)): Path<(i64, i64)>,
    pool: Extension<PgPool>,
) -> Result<Json<AssignmentEnvelope>, AssignmentError> {
    let assignment = fetch_assignment(&pool, role_id, permission_id)
        .await?
        .ok_or(AssignmentError::AssignmentNotFound {
            role_id,
            permission_id,
        })?;
    Ok(Json(AssignmentEnvelope {
        message: "Relación rol-permiso obtenida exitosamente".to_string(),
        assignment,
        already_assigned: true,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/protected/role-permissions/{role_id}/{permission_id}",
    params(
        ("role_id" = i64, Path, description = "Role id"),
        ("permission_id" = i64, Path, description = "Permission id"),
    ),
    responses(
        (status = 200, description = "Pair removed.", body = MessageResponse),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Pair not found; nothing changed.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
/// Removes one pair. A pair that is not assigned answers 404 and leaves the role untouched,
/// so a repeated call is safe but not silent.
pub async fn unassign(
    Path((role_id, permission_id)): Path<(i64, i64)>,
    pool: Extension<PgPool>,
) -> Result<Json<MessageResponse>, AssignmentError> {
    if !delete_assignment(&pool, role_id, permission_id).await? {
        return Err(AssignmentError::AssignmentNotFound {
            role_id,
            permission_id,
        });
    }
    info!(role_id, permission_id, "Permission unassigned");
    Ok(Json(MessageResponse {
        message: "Relación rol-permiso eliminada exitosamente".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/protected/role-permissions/bulk",
    request_body = BulkAssignRequest,
    responses(
        (status = 200, description = "Changes applied atomically.", body = BulkAssignResponse),
        (status = 400, description = "Malformed body.", body = ErrorBody),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Role or a permission to assign not found; nothing applied.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
/// Unassigns, then assigns, in a single transaction.
pub async fn bulk(
    pool: Extension<PgPool>,
    payload: Result<Json<BulkAssignRequest>, JsonRejection>,
) -> Result<Json<BulkAssignResponse>, AssignmentError> {
    let request = body(payload)?;
    let plan = bulk_assign(
        &pool,
        request.role_id,
        &request.to_assign,
        &request.to_unassign,
    )
    .await?;

    Ok(Json(BulkAssignResponse {
        message: "Operación de permisos completada exitosamente".to_string(),
        role_id: request.role_id,
        assigned: plan.assigned,
        already_assigned: plan.already_assigned,
        unassigned: plan.unassigned,
    }))
}

#[utoipa::path(
    get,
    path = "/api/protected/roles/{id}/permissions",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Permissions held by the role, grouped by category.", body = GroupedPermissions),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Role not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
pub async fn role_permissions(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
) -> Result<Json<GroupedPermissions>, AssignmentError> {
    let groups = list_role_permissions(&pool, id).await?;
    Ok(Json(GroupedPermissions {
        message: "Permisos del rol obtenidos exitosamente".to_string(),
        role_id: id,
        groups,
    }))
}

#[utoipa::path(
    get,
    path = "/api/protected/roles/{id}/permissions/state",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Every permission grouped by category, flagged when held by the role.", body = GroupedPermissions),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Role not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
pub async fn role_permission_state(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
) -> Result<Json<GroupedPermissions>, AssignmentError> {
    let groups = list_with_assignment_state(&pool, id).await?;
    Ok(Json(GroupedPermissions {
        message: "Permisos con estado de asignación obtenidos exitosamente".to_string(),
        role_id: id,
        groups,
    }))
}
