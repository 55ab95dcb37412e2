//! Role CRUD handlers.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::Json,
};
use sqlx::PgPool;
use tracing::info;

use super::{
    error::CatalogError,
    json_body, required,
    storage::{
        fetch_role, fetch_roles, insert_role, role_name_taken, soft_delete_role, update_role,
    },
    types::{CreateRoleRequest, MessageResponse, RoleEnvelope, RoleList, UpdateRoleRequest},
};
use crate::api::handlers::ErrorBody;

#[utoipa::path(
    get,
    path = "/api/protected/roles",
    responses(
        (status = 200, description = "Active roles, newest first.", body = RoleList),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
pub async fn list_roles(pool: Extension<PgPool>) -> Result<Json<RoleList>, CatalogError> {
    let roles = fetch_roles(&pool).await?;
    Ok(Json(RoleList {
        message: "Roles obtenidos exitosamente".to_string(),
        roles,
    }))
}

#[utoipa::path(
    post,
    path = "/api/protected/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created.", body = RoleEnvelope),
        (status = 400, description = "Missing name or name already in use.", body = ErrorBody),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
/// Creates a role; names are unique among active roles.
pub async fn create_role(
    pool: Extension<PgPool>,
    payload: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RoleEnvelope>), CatalogError> {
    let request = json_body(payload)?;
    let name = required(&request.name, "El nombre del rol es obligatorio")?;

    if role_name_taken(&pool, &name, None).await? {
        return Err(CatalogError::DuplicateRoleName);
    }

    let role = insert_role(&pool, &name, &request).await?;
    info!(role_id = role.id, "Role created");

    Ok((
        StatusCode::CREATED,
        Json(RoleEnvelope {
            message: "Rol creado exitosamente".to_string(),
            role,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/protected/roles/{id}",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role detail.", body = RoleEnvelope),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Role not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
pub async fn get_role(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
) -> Result<Json<RoleEnvelope>, CatalogError> {
    let role = fetch_role(&pool, id)
        .await?
        .ok_or(CatalogError::RoleNotFound)?;
    Ok(Json(RoleEnvelope {
        message: "Rol obtenido exitosamente".to_string(),
        role,
    }))
}

#[utoipa::path(
    put,
    path = "/api/protected/roles/{id}",
    params(("id" = i64, Path, description = "Role id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated.", body = RoleEnvelope),
        (status = 400, description = "Invalid input or name already in use.", body = ErrorBody),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Role not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
/// Partial update: only the provided fields change.
pub async fn update_role_handler(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> Result<Json<RoleEnvelope>, CatalogError> {
    let mut request = json_body(payload)?;

    if let Some(name) = request.name.as_deref() {
        let name = required(name, "El nombre del rol no puede estar vacío")?;
        if role_name_taken(&pool, &name, Some(id)).await? {
            return Err(CatalogError::DuplicateRoleName);
        }
        request.name = Some(name);
    }

    let role = update_role(&pool, id, &request)
        .await?
        .ok_or(CatalogError::RoleNotFound)?;

    Ok(Json(RoleEnvelope {
        message: "Rol actualizado exitosamente".to_string(),
        role,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/protected/roles/{id}",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role soft-deleted.", body = MessageResponse),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Role not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "roles"
)]
pub async fn delete_role(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
) -> Result<Json<MessageResponse>, CatalogError> {
    if !soft_delete_role(&pool, id).await? {
        return Err(CatalogError::RoleNotFound);
    }
    info!(role_id = id, "Role deleted");
    Ok(Json(MessageResponse {
        message: "Rol eliminado exitosamente".to_string(),
    }))
}
