//! SQL for roles, categories, permissions and role-permission rows.
//!
//! Listings exclude soft-deleted rows. Functions return `sqlx::Error` and leave the
//! HTTP mapping to the handlers.

use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument, Span};

use super::{
    role_label,
    types::{
        AssignmentResponse, CategoryRef, CategoryResponse, CreateCategoryRequest,
        CreatePermissionRequest, CreateRoleRequest, GroupedPermission, PermissionRef,
        PermissionResponse, RoleRef, RoleResponse, UpdateCategoryRequest,
        UpdatePermissionRequest, UpdateRoleRequest,
    },
};

const ROLE_COLUMNS: &str =
    "id, name, description, icon, for_students, for_staff, for_tutors, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, title, description, icon, created_at, updated_at";

const PERMISSION_SELECT: &str = r"
    SELECT p.id, p.title, p.description, p.category_id, p.created_at, p.updated_at,
           c.title AS category_title
    FROM permissions p
    JOIN permission_categories c ON c.id = p.category_id
";

fn query_span(operation: &'static str, statement: &str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn role_from_row(row: &PgRow) -> RoleResponse {
    let for_students: bool = row.get("for_students");
    let for_staff: bool = row.get("for_staff");
    let for_tutors: bool = row.get("for_tutors");
    RoleResponse {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        icon: row.get("icon"),
        for_students,
        for_staff,
        for_tutors,
        tipo: role_label(for_students, for_staff, for_tutors).to_string(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        permissions: None,
    }
}

fn category_from_row(row: &PgRow) -> CategoryResponse {
    CategoryResponse {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        icon: row.get("icon"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn permission_from_row(row: &PgRow) -> PermissionResponse {
    let category_id: i64 = row.get("category_id");
    PermissionResponse {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        category_id,
        category: CategoryRef {
            id: category_id,
            title: row.get("category_title"),
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// Roles

/// Active roles, newest first.
pub(crate) async fn fetch_roles(pool: &PgPool) -> Result<Vec<RoleResponse>, sqlx::Error> {
    let query = format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE deleted_at IS NULL ORDER BY id DESC"
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    Ok(rows.iter().map(role_from_row).collect())
}

pub(crate) async fn fetch_role(pool: &PgPool, id: i64) -> Result<Option<RoleResponse>, sqlx::Error> {
    let query = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 AND deleted_at IS NULL");
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    Ok(row.as_ref().map(role_from_row))
}

pub(crate) async fn role_exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let query = "SELECT 1 FROM roles WHERE id = $1 AND deleted_at IS NULL";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await?;
    Ok(row.is_some())
}

/// Whether an active role other than `exclude_id` already uses `name`.
pub(crate) async fn role_name_taken(
    pool: &PgPool,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let query = r"
        SELECT 1 FROM roles
        WHERE name = $1
          AND deleted_at IS NULL
          AND ($2::BIGINT IS NULL OR id <> $2)
        LIMIT 1
    ";
    let row = sqlx::query(query)
        .bind(name)
        .bind(exclude_id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await?;
    Ok(row.is_some())
}

pub(crate) async fn insert_role(
    pool: &PgPool,
    name: &str,
    request: &CreateRoleRequest,
) -> Result<RoleResponse, sqlx::Error> {
    let query = format!(
        r"
        INSERT INTO roles (name, description, icon, for_students, for_staff, for_tutors)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {ROLE_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(name)
        .bind(request.description.trim())
        .bind(request.icon.as_deref())
        .bind(request.for_students)
        .bind(request.for_staff)
        .bind(request.for_tutors)
        .fetch_one(pool)
        .instrument(query_span("INSERT", &query))
        .await?;
    Ok(role_from_row(&row))
}

/// Apply the provided fields; `None` when the role does not exist.
pub(crate) async fn update_role(
    pool: &PgPool,
    id: i64,
    request: &UpdateRoleRequest,
) -> Result<Option<RoleResponse>, sqlx::Error> {
    let query = format!(
        r"
        UPDATE roles
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            icon = COALESCE($4, icon),
            for_students = COALESCE($5, for_students),
            for_staff = COALESCE($6, for_staff),
            for_tutors = COALESCE($7, for_tutors),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {ROLE_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.description.as_deref())
        .bind(request.icon.as_deref())
        .bind(request.for_students)
        .bind(request.for_staff)
        .bind(request.for_tutors)
        .fetch_optional(pool)
        .instrument(query_span("UPDATE", &query))
        .await?;
    Ok(row.as_ref().map(role_from_row))
}

pub(crate) async fn soft_delete_role(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let query = r"
        UPDATE roles SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
    ";
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await?;
    Ok(result.rows_affected() > 0)
}

// Permission categories

pub(crate) async fn fetch_categories(pool: &PgPool) -> Result<Vec<CategoryResponse>, sqlx::Error> {
    let query = format!(
        "SELECT {CATEGORY_COLUMNS} FROM permission_categories WHERE deleted_at IS NULL ORDER BY id"
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    Ok(rows.iter().map(category_from_row).collect())
}

pub(crate) async fn fetch_category(
    pool: &PgPool,
    id: i64,
) -> Result<Option<CategoryResponse>, sqlx::Error> {
    let query = format!(
        "SELECT {CATEGORY_COLUMNS} FROM permission_categories WHERE id = $1 AND deleted_at IS NULL"
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    Ok(row.as_ref().map(category_from_row))
}

pub(crate) async fn insert_category(
    pool: &PgPool,
    title: &str,
    request: &CreateCategoryRequest,
) -> Result<CategoryResponse, sqlx::Error> {
    let query = format!(
        r"
        INSERT INTO permission_categories (title, description, icon)
        VALUES ($1, $2, $3)
        RETURNING {CATEGORY_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(title)
        .bind(request.description.trim())
        .bind(request.icon.as_deref())
        .fetch_one(pool)
        .instrument(query_span("INSERT", &query))
        .await?;
    Ok(category_from_row(&row))
}

pub(crate) async fn update_category(
    pool: &PgPool,
    id: i64,
    request: &UpdateCategoryRequest,
) -> Result<Option<CategoryResponse>, sqlx::Error> {
    let query = format!(
        r"
        UPDATE permission_categories
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            icon = COALESCE($4, icon),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {CATEGORY_COLUMNS}
        "
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(request.description.as_deref())
        .bind(request.icon.as_deref())
        .fetch_optional(pool)
        .instrument(query_span("UPDATE", &query))
        .await?;
    Ok(row.as_ref().map(category_from_row))
}

pub(crate) async fn soft_delete_category(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let query = r"
        UPDATE permission_categories SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
    ";
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn category_exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let query = "SELECT 1 FROM permission_categories WHERE id = $1 AND deleted_at IS NULL";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await?;
    Ok(row.is_some())
}

// Permissions

pub(crate) async fn fetch_permissions(
    pool: &PgPool,
) -> Result<Vec<PermissionResponse>, sqlx::Error> {
    let query = format!("{PERMISSION_SELECT} WHERE p.deleted_at IS NULL ORDER BY p.id");
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    Ok(rows.iter().map(permission_from_row).collect())
}

pub(crate) async fn fetch_permission(
    pool: &PgPool,
    id: i64,
) -> Result<Option<PermissionResponse>, sqlx::Error> {
    let query = format!("{PERMISSION_SELECT} WHERE p.id = $1 AND p.deleted_at IS NULL");
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    Ok(row.as_ref().map(permission_from_row))
}

pub(crate) async fn permission_exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let query = "SELECT 1 FROM permissions WHERE id = $1 AND deleted_at IS NULL";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await?;
    Ok(row.is_some())
}

/// Insert and return the new permission id.
pub(crate) async fn insert_permission(
    pool: &PgPool,
    title: &str,
    request: &CreatePermissionRequest,
) -> Result<i64, sqlx::Error> {
    let query = r"
        INSERT INTO permissions (title, description, category_id)
        VALUES ($1, $2, $3)
        RETURNING id
    ";
    let row = sqlx::query(query)
        .bind(title)
        .bind(request.description.trim())
        .bind(request.category_id)
        .fetch_one(pool)
        .instrument(query_span("INSERT", query))
        .await?;
    Ok(row.get("id"))
}

/// Apply the provided fields; `false` when the permission does not exist.
pub(crate) async fn update_permission(
    pool: &PgPool,
    id: i64,
    request: &UpdatePermissionRequest,
) -> Result<bool, sqlx::Error> {
    let query = r"
        UPDATE permissions
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            category_id = COALESCE($4, category_id),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
    ";
    let result = sqlx::query(query)
        .bind(id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(request.description.as_deref())
        .bind(request.category_id)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn soft_delete_permission(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let query = r"
        UPDATE permissions SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
    ";
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await?;
    Ok(result.rows_affected() > 0)
}

// Role-permission rows

/// Active permissions held by `role_id`, with their category.
pub(crate) async fn fetch_role_permissions(
    pool: &PgPool,
    role_id: i64,
) -> Result<Vec<PermissionResponse>, sqlx::Error> {
    let query = format!(
        r"{PERMISSION_SELECT}
        JOIN role_permissions rp ON rp.permission_id = p.id
        WHERE rp.role_id = $1 AND p.deleted_at IS NULL
        ORDER BY p.id"
    );
    let rows = sqlx::query(&query)
        .bind(role_id)
        .fetch_all(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    Ok(rows.iter().map(permission_from_row).collect())
}

/// Every active permission with its category and whether `role_id` holds it.
pub(crate) async fn fetch_permission_states(
    pool: &PgPool,
    role_id: i64,
    assigned_only: bool,
) -> Result<Vec<(CategoryRef, GroupedPermission)>, sqlx::Error> {
    let query = r"
        SELECT p.id, p.title, p.description, p.category_id,
               c.title AS category_title,
               rp.role_id IS NOT NULL AS assigned
        FROM permissions p
        JOIN permission_categories c ON c.id = p.category_id
        LEFT JOIN role_permissions rp ON rp.permission_id = p.id AND rp.role_id = $1
        WHERE p.deleted_at IS NULL
          AND (NOT $2 OR rp.role_id IS NOT NULL)
        ORDER BY p.id
    ";
    let rows = sqlx::query(query)
        .bind(role_id)
        .bind(assigned_only)
        .fetch_all(pool)
        .instrument(query_span("SELECT", query))
        .await?;

    Ok(rows
        .iter()
        .map(|row| {
            (
                CategoryRef {
                    id: row.get("category_id"),
                    title: row.get("category_title"),
                },
                GroupedPermission {
                    id: row.get("id"),
                    title: row.get("title"),
                    description: row.get("description"),
                    assigned: row.get("assigned"),
                },
            )
        })
        .collect())
}

const ASSIGNMENT_SELECT: &str = r"
    SELECT rp.role_id, rp.permission_id, r.name AS role_name, p.title AS permission_title
    FROM role_permissions rp
    JOIN roles r ON r.id = rp.role_id
    JOIN permissions p ON p.id = rp.permission_id
";

fn assignment_from_row(row: &PgRow) -> AssignmentResponse {
    let role_id: i64 = row.get("role_id");
    let permission_id: i64 = row.get("permission_id");
    AssignmentResponse {
        role_id,
        permission_id,
        role: RoleRef {
            id: role_id,
            name: row.get("role_name"),
        },
        permission: PermissionRef {
            id: permission_id,
            title: row.get("permission_title"),
        },
    }
}

pub(crate) async fn fetch_assignments(
    pool: &PgPool,
) -> Result<Vec<AssignmentResponse>, sqlx::Error> {
    let query = format!("{ASSIGNMENT_SELECT} ORDER BY rp.role_id, rp.permission_id");
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    Ok(rows.iter().map(assignment_from_row).collect())
}

pub(crate) async fn fetch_assignment(
    pool: &PgPool,
    role_id: i64,
    permission_id: i64,
) -> Result<Option<AssignmentResponse>, sqlx::Error> {
    let query = format!("{ASSIGNMENT_SELECT} WHERE rp.role_id = $1 AND rp.permission_id = $2");
    let row = sqlx::query(&query)
        .bind(role_id)
        .bind(permission_id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    Ok(row.as_ref().map(assignment_from_row))
}

/// Insert the pair; `false` when it already existed.
pub(crate) async fn insert_assignment(
    pool: &PgPool,
    role_id: i64,
    permission_id: i64,
) -> Result<bool, sqlx::Error> {
    let query = r"
        INSERT INTO role_permissions (role_id, permission_id)
        VALUES ($1, $2)
        ON CONFLICT (role_id, permission_id) DO NOTHING
    ";
    let result = sqlx::query(query)
        .bind(role_id)
        .bind(permission_id)
        .execute(pool)
        .instrument(query_span("INSERT", query))
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete the pair; `false` when it did not exist.
pub(crate) async fn delete_assignment(
    pool: &PgPool,
    role_id: i64,
    permission_id: i64,
) -> Result<bool, sqlx::Error> {
    let query = "DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2";
    let result = sqlx::query(query)
        .bind(role_id)
        .bind(permission_id)
        .execute(pool)
        .instrument(query_span("DELETE", query))
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn fetch_roles_of_permission(
    pool: &PgPool,
    permission_id: i64,
) -> Result<Vec<RoleRef>, sqlx::Error> {
    let query = r"
        SELECT r.id, r.name
        FROM role_permissions rp
        JOIN roles r ON r.id = rp.role_id
        WHERE rp.permission_id = $1 AND r.deleted_at IS NULL
        ORDER BY r.id
    ";
    let rows = sqlx::query(query)
        .bind(permission_id)
        .fetch_all(pool)
        .instrument(query_span("SELECT", query))
        .await?;
    Ok(rows
        .iter()
        .map(|row| RoleRef {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}
