//! Request/response types for the role and permission catalog.
//!
//! Rust field names are English; the JSON names match the school frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleResponse {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "icono")]
    pub icon: Option<String>,
    #[serde(rename = "para_estudiante")]
    pub for_students: bool,
    #[serde(rename = "para_personal")]
    pub for_staff: bool,
    #[serde(rename = "para_tutor")]
    pub for_tutors: bool,
    /// Display label derived from the audience flags.
    pub tipo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "permisos", skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<PermissionResponse>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateRoleRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "icono", default)]
    pub icon: Option<String>,
    #[serde(rename = "para_estudiante", default)]
    pub for_students: bool,
    #[serde(rename = "para_personal", default)]
    pub for_staff: bool,
    #[serde(rename = "para_tutor", default)]
    pub for_tutors: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateRoleRequest {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "icono")]
    pub icon: Option<String>,
    #[serde(rename = "para_estudiante")]
    pub for_students: Option<bool>,
    #[serde(rename = "para_personal")]
    pub for_staff: Option<bool>,
    #[serde(rename = "para_tutor")]
    pub for_tutors: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleEnvelope {
    pub message: String,
    #[serde(rename = "rol")]
    pub role: RoleResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleList {
    pub message: String,
    pub roles: Vec<RoleResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "icono")]
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "icono", default)]
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCategoryRequest {
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "icono")]
    pub icon: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryEnvelope {
    pub message: String,
    #[serde(rename = "categoria")]
    pub category: CategoryResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub message: String,
    #[serde(rename = "categorias")]
    pub categories: Vec<CategoryResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryRef {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionResponse {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "categoria_permiso_id")]
    pub category_id: i64,
    #[serde(rename = "categoria_permiso")]
    pub category: CategoryRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreatePermissionRequest {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "categoria_permiso_id")]
    pub category_id: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePermissionRequest {
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "categoria_permiso_id")]
    pub category_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionEnvelope {
    pub message: String,
    #[serde(rename = "permiso")]
    pub permission: PermissionResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionList {
    pub message: String,
    #[serde(rename = "permisos")]
    pub permissions: Vec<PermissionResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleRef {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionRef {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignmentResponse {
    pub role_id: i64,
    #[serde(rename = "permiso_id")]
    pub permission_id: i64,
    #[serde(rename = "rol")]
    pub role: RoleRef,
    #[serde(rename = "permiso")]
    pub permission: PermissionRef,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentEnvelope {
    pub message: String,
    #[serde(rename = "relacion")]
    pub assignment: AssignmentResponse,
    /// `true` when the pair already existed and nothing was written.
    pub already_assigned: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentList {
    pub message: String,
    #[serde(rename = "relaciones")]
    pub assignments: Vec<AssignmentResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RolesOfPermission {
    pub message: String,
    pub roles: Vec<RoleRef>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AssignRequest {
    pub role_id: i64,
    #[serde(rename = "permiso_id")]
    pub permission_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BulkAssignRequest {
    pub role_id: i64,
    #[serde(rename = "permisos_por_asignar", default)]
    pub to_assign: Vec<i64>,
    #[serde(rename = "permisos_por_desasignar", default)]
    pub to_unassign: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkAssignResponse {
    pub message: String,
    pub role_id: i64,
    #[serde(rename = "permisos_asignados")]
    pub assigned: Vec<i64>,
    #[serde(rename = "permisos_ya_asignados")]
    pub already_assigned: Vec<i64>,
    #[serde(rename = "permisos_desasignados")]
    pub unassigned: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GroupedPermission {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "asignado")]
    pub assigned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PermissionGroup {
    #[serde(rename = "categoria")]
    pub category: CategoryRef,
    #[serde(rename = "permisos")]
    pub permissions: Vec<GroupedPermission>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupedPermissions {
    pub message: String,
    pub role_id: i64,
    #[serde(rename = "permisos_agrupados")]
    pub groups: Vec<PermissionGroup>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
