//! Roles, permission categories, permissions and their role assignments.
//!
//! Handler modules parse inputs and map the flow; `storage` owns the SQL and row
//! shaping, and `assignment` holds the role-permission engine whose planning and
//! grouping steps are pure.
//!
//! Everything here sits behind the access gate. Deletes are soft: rows keep their
//! ids and drop out of every listing once `deleted_at` is set.

pub mod assignment;
pub mod categories;
pub mod error;
pub mod permissions;
pub mod relations;
pub mod roles;
pub mod storage;
pub mod types;

use axum::extract::{rejection::JsonRejection, Json};

use error::CatalogError;

const ROLE_LABEL_STUDENTS: &str = "Para estudiante";
const ROLE_LABEL_STAFF: &str = "Para personal";
const ROLE_LABEL_TUTORS: &str = "Para tutor";

/// Display label for a role; the first matching audience flag wins.
#[must_use]
pub fn role_label(for_students: bool, for_staff: bool, for_tutors: bool) -> &'static str {
    if for_students {
        ROLE_LABEL_STUDENTS
    } else if for_staff {
        ROLE_LABEL_STAFF
    } else if for_tutors {
        ROLE_LABEL_TUTORS
    } else {
        ""
    }
}

/// Unwrap a JSON body, turning axum's rejection into a 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, CatalogError> {
    payload
        .map(|Json(body)| body)
        .map_err(|err| CatalogError::Validation(err.body_text()))
}

/// Trimmed, non-empty value of a required text field.
fn required(value: &str, message: &str) -> Result<String, CatalogError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CatalogError::Validation(message.to_string()))
    } else {
        Ok(value.to_string())
    }
}
