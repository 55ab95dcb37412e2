//! Permission category CRUD handlers.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::Json,
};
use sqlx::PgPool;

use super::{
    error::CatalogError,
    json_body, required,
    storage::{
        fetch_categories, fetch_category, insert_category, soft_delete_category, update_category,
    },
    types::{
        CategoryEnvelope, CategoryList, CreateCategoryRequest, MessageResponse,
        UpdateCategoryRequest,
    },
};
use crate::api::handlers::ErrorBody;

#[utoipa::path(
    get,
    path = "/api/protected/permission-categories",
    responses(
        (status = 200, description = "Active permission categories.", body = CategoryList),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn list_categories(pool: Extension<PgPool>) -> Result<Json<CategoryList>, CatalogError> {
    let categories = fetch_categories(&pool).await?;
    Ok(Json(CategoryList {
        message: "Categorías de permisos obtenidas exitosamente".to_string(),
        categories,
    }))
}

#[utoipa::path(
    post,
    path = "/api/protected/permission-categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created.", body = CategoryEnvelope),
        (status = 400, description = "Missing title.", body = ErrorBody),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn create_category(
    pool: Extension<PgPool>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryEnvelope>), CatalogError> {
    let request = json_body(payload)?;
    let title = required(&request.title, "El título de la categoría es obligatorio")?;
    let category = insert_category(&pool, &title, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryEnvelope {
            message: "Categoría de permiso creada exitosamente".to_string(),
            category,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/protected/permission-categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category detail.", body = CategoryEnvelope),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Category not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn get_category(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
) -> Result<Json<CategoryEnvelope>, CatalogError> {
    let category = fetch_category(&pool, id)
        .await?
        .ok_or(CatalogError::CategoryNotFound)?;
    Ok(Json(CategoryEnvelope {
        message: "Categoría de permiso obtenida exitosamente".to_string(),
        category,
    }))
}

#[utoipa::path(
    put,
    path = "/api/protected/permission-categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated.", body = CategoryEnvelope),
        (status = 400, description = "Invalid input.", body = ErrorBody),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Category not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn update_category_handler(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
    payload: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> Result<Json<CategoryEnvelope>, CatalogError> {
    let mut request = json_body(payload)?;
    if let Some(title) = request.title.as_deref() {
        request.title = Some(required(title, "El título de la categoría no puede estar vacío")?);
    }

    let category = update_category(&pool, id, &request)
        .await?
        .ok_or(CatalogError::CategoryNotFound)?;
    Ok(Json(CategoryEnvelope {
        message: "Categoría de permiso actualizada exitosamente".to_string(),
        category,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/protected/permission-categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category soft-deleted.", body = MessageResponse),
        (status = 401, description = "Rejected by the access gate.", body = ErrorBody),
        (status = 404, description = "Category not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "permissions"
)]
pub async fn delete_category(
    Path(id): Path<i64>,
    pool: Extension<PgPool>,
) -> Result<Json<MessageResponse>, CatalogError> {
    if !soft_delete_category(&pool, id).await? {
        return Err(CatalogError::CategoryNotFound);
    }
    Ok(Json(MessageResponse {
        message: "Categoría de permiso eliminada exitosamente".to_string(),
    }))
}
