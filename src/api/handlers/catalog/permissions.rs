//! Permission CRUD handlers plus the roles holding a permission.

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
        category_exists, fetch_permission, fetch_permissions, fetch_roles_of_permission,
        insert_permission, permission_exists, soft_delete_permission, update_permission,
    },
    types::{
        CreatePermissionRequest, MessageResponse, PermissionEnvelope, PermissionList,
        RolesOfPermission, UpdatePermissionRequest,
    },
};
use crate::api::handlers::ErrorBody;

#[utoipa::path(
    get,
    path = "/api/protected/permissions",
    responses(
        (status = 200, description = "Active permissions with their category.", body = PermissionList),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn list_permissions(
    pool: Extension<PgPool>,
) -> Result<Json<PermissionList>, CatalogError> {
    let permissions = fetch_permissions(&pool).await?;
    Ok(Json(PermissionList {
        message: "Permisos obtenidos exitosamente".to_string(),
        permissions,
    }))
}

#[utoipa::path(
    post,
    path = "/api/protected/permissions",
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created.", body = PermissionEnvelope),
        (status = 400, description = "Missing title.", body = ErrorBody),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Category not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
/// Creates a permission under an existing, non-deleted category.
pub async fn create_permission(
    pool: Extension<PgPool>,
    payload: Result<Json<CreatePermissionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PermissionEnvelope>), CatalogError> {
    let request = json_body(payload)?;
    let title = required(&request.title, "El título del permiso es obligatorio")?;

    if !category_exists(&pool, request.category_id).await? {
        return Err(CatalogError::CategoryNotFound);
    }

    let id = insert_permission(&pool, &title, &request).await?;
    let permission = fetch_permission(&pool, id)
        .await?
        .ok_or(CatalogError::PermissionNotFound)?;
    info!(permission_id = id, "Permission created");

    Ok((
        StatusCode::CREATED,
        Json(PermissionEnvelope {
            message: "Permiso creado exitosamente".to_string(),
            permission,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/protected/permissions/{id}",
    params(("id" = i64, Path, description = "Permission id")),
    responses(
        (status = 200, description = "Permission detail.", body = PermissionEnvelope),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Permission not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn get_permission(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
) -> Result<Json<PermissionEnvelope>, CatalogError> {
    let permission = fetch_permission(&pool, id)
        .await?
        .ok_or(CatalogError::PermissionNotFound)?;
    Ok(Json(PermissionEnvelope {
        message: "Permiso obtenido exitosamente".to_string(),
        permission,
    }))
}

#[utoipa::path(
    put,
    path = "/api/protected/permissions/{id}",
    params(("id" = i64, Path, description = "Permission id")),
    request_body = UpdatePermissionRequest,
    responses(
        (status = 200, description = "Permission updated.", body = PermissionEnvelope),
        (status = 400, description = "Invalid input.", body = ErrorBody),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Permission or category not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn update_permission_handler(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
    payload: Result<Json<UpdatePermissionRequest>, JsonRejection>,
) -> Result<Json<PermissionEnvelope>, CatalogError> {
    let mut request = json_body(payload)?;
    if let Some(title) = request.title.as_deref() {
        request.title = Some(required(title, "El título del permiso no puede estar vacío")?);
    }
    if let Some(category_id) = request.category_id {
        if !category_exists(&pool, category_id).await? {
            return Err(CatalogError::CategoryNotFound);
        }
    }

    if !update_permission(&pool, id, &request).await? {
        return Err(CatalogError::PermissionNotFound);
    }
    let permission = fetch_permission(&pool, id)
        .await?
        .ok_or(CatalogError::PermissionNotFound)?;

    Ok(Json(PermissionEnvelope {
        message: "Permiso actualizado exitosamente".to_string(),
        permission,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/protected/permissions/{id}",
    params(("id" = i64, Path, description = "Permission id")),
    responses(
        (status = 200, description = "Permission soft-deleted.", body = MessageResponse),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Permission not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn delete_permission(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
) -> Result<Json<MessageResponse>, CatalogError> {
    if !soft_delete_permission(&pool, id).await? {
        return Err(CatalogError::PermissionNotFound);
    }
    Ok(Json(MessageResponse {
        message: "Permiso eliminado exitosamente".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/protected/permissions/{id}/roles",
    params(("id" = i64, Path, description = "Permission id")),
    responses(
        (status = 200, description = "Active roles holding the permission.", body = RolesOfPermission),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Permission not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn roles_of_permission(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
) -> Result<Json<RolesOfPermission>, CatalogError> {
    if !permission_exists(&pool, id).await? {
        return Err(CatalogError::PermissionNotFound);
    }
    let roles = fetch_roles_of_permission(&pool, id).await?;
    Ok(Json(RolesOfPermission {
        message: "Roles del permiso obtenidos exitosamente".to_string(),
        roles,
    }))
}
