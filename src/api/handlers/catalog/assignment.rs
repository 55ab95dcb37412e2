//! Role-permission assignment engine.
//!
//! `plan_bulk` and `group_by_category` are pure; `bulk_assign` runs the plan in
//! one transaction with the role row locked, so concurrent bulk calls on the same
//! role serialize and a failure leaves no partial state behind.

use sqlx::{PgPool, Row};
use std::collections::{HashMap, HashSet};
use tracing::{info, info_span, Instrument};

use super::{
    error::AssignmentError,
    storage::{fetch_permission_states, role_exists},
    types::{CategoryRef, GroupedPermission, PermissionGroup},
};

/// Outcome of a bulk call, in request order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkPlan {
    /// Requested removals that were actually held.
    pub unassigned: Vec<i64>,
    pub assigned: Vec<i64>,
    pub already_assigned: Vec<i64>,
}

/// Decide what a bulk call does given the role's current set and the live permission ids.
///
/// Removals apply first. Unknown ids in `to_unassign` are ignored; an unknown id in
/// `to_assign` fails the whole call. Repeated ids count once and then as already held.
///
/// # Errors
/// Returns `PermissionNotFound` for the first id in `to_assign` missing from `known`.
pub fn plan_bulk(
    current: &HashSet<i64>,
    known: &HashSet<i64>,
    to_assign: &[i64],
    to_unassign: &[i64],
) -> Result<BulkPlan, AssignmentError> {
    let mut held = current.clone();
    let mut plan = BulkPlan::default();

    for &id in to_unassign {
        if held.remove(&id) {
            plan.unassigned.push(id);
        }
    }

    for &id in to_assign {
        if !known.contains(&id) {
            return Err(AssignmentError::PermissionNotFound(id));
        }
        if held.insert(id) {
            plan.assigned.push(id);
        } else {
            plan.already_assigned.push(id);
        }
    }

    Ok(plan)
}

/// Group permissions under their category.
///
/// `seed` categories come first and appear even when empty; categories only seen
/// through a permission follow in first-seen order.
#[must_use]
pub fn group_by_category(
    seed: &[CategoryRef],
    permissions: Vec<(CategoryRef, GroupedPermission)>,
) -> Vec<PermissionGroup> {
    let mut groups: Vec<PermissionGroup> = seed
        .iter()
        .map(|category| PermissionGroup {
            category: category.clone(),
            permissions: Vec::new(),
        })
        .collect();
    let mut index: HashMap<i64, usize> = groups
        .iter()
        .enumerate()
        .map(|(position, group)| (group.category.id, position))
        .collect();

    for (category, permission) in permissions {
        let position = *index.entry(category.id).or_insert_with(|| {
            groups.push(PermissionGroup {
                category,
                permissions: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].permissions.push(permission);
    }

    groups
}

/// Every permission grouped by category, flagged with whether `role_id` holds it.
///
/// Every live category appears in id order, including ones with no permissions,
/// so the editor can render the full catalog. `list_role_permissions` only lists
/// categories the role draws from.
///
/// # Errors
/// Returns `RoleNotFound` for an unknown or deleted role.
pub async fn list_with_assignment_state(
    pool: &PgPool,
    role_id: i64,
) -> Result<Vec<PermissionGroup>, AssignmentError> {
    if !role_exists(pool, role_id).await? {
        return Err(AssignmentError::RoleNotFound(role_id));
    }

    let query = r"
        SELECT id, title FROM permission_categories
        WHERE deleted_at IS NULL
        ORDER BY id
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let categories: Vec<CategoryRef> = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await?
        .iter()
        .map(|row| CategoryRef {
            id: row.get("id"),
            title: row.get("title"),
        })
        .collect();

    let permissions = fetch_permission_states(pool, role_id, false).await?;
    Ok(group_by_category(&categories, permissions))
}

/// Only the permissions `role_id` holds, grouped by category.
///
/// # Errors
/// Returns `RoleNotFound` for an unknown or deleted role.
pub async fn list_role_permissions(
    pool: &PgPool,
    role_id: i64,
) -> Result<Vec<PermissionGroup>, AssignmentError> {
    if !role_exists(pool, role_id).await? {
        return Err(AssignmentError::RoleNotFound(role_id));
    }
    let permissions = fetch_permission_states(pool, role_id, true).await?;
    Ok(group_by_category(&[], permissions))
}

/// Apply a bulk assign/unassign for `role_id` atomically.
///
/// # Errors
/// Returns `RoleNotFound`, `PermissionNotFound` (nothing applied) or `Database`.
pub async fn bulk_assign(
    pool: &PgPool,
    role_id: i64,
    to_assign: &[i64],
    to_unassign: &[i64],
) -> Result<BulkPlan, AssignmentError> {
    // Dropping `tx` on any early return rolls the transaction back.
    let mut tx = pool.begin().await?;

    let query = "SELECT id FROM roles WHERE id = $1 AND deleted_at IS NULL FOR UPDATE";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let role = sqlx::query(query)
        .bind(role_id)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await?;
    if role.is_none() {
        return Err(AssignmentError::RoleNotFound(role_id));
    }

    let query = "SELECT permission_id FROM role_permissions WHERE role_id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let current: HashSet<i64> = sqlx::query_scalar::<_, i64>(query)
        .bind(role_id)
        .fetch_all(&mut *tx)
        .instrument(span)
        .await?
        .into_iter()
        .collect();

    let query = "SELECT id FROM permissions WHERE id = ANY($1) AND deleted_at IS NULL";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let known: HashSet<i64> = sqlx::query_scalar::<_, i64>(query)
        .bind(to_assign.to_vec())
        .fetch_all(&mut *tx)
        .instrument(span)
        .await?
        .into_iter()
        .collect();

    let plan = plan_bulk(&current, &known, to_assign, to_unassign)?;

    if !plan.unassigned.is_empty() {
        let query = "DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = ANY($2)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(role_id)
            .bind(plan.unassigned.clone())
            .execute(&mut *tx)
            .instrument(span)
            .await?;
    }

    if !plan.assigned.is_empty() {
        let query = r"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT (role_id, permission_id) DO NOTHING
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(role_id)
            .bind(plan.assigned.clone())
            .execute(&mut *tx)
            .instrument(span)
            .await?;
    }

    tx.commit().await?;

    info!(
        role_id,
        assigned = plan.assigned.len(),
        already_assigned = plan.already_assigned.len(),
        unassigned = plan.unassigned.len(),
        "Applied bulk permission assignment"
    );

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[i64]) -> HashSet<i64> {
        ids.iter().copied().collect()
    }

    fn category(id: i64) -> CategoryRef {
        CategoryRef {
            id,
            title: format!("Categoría {id}"),
        }
    }

    fn permission(id: i64, assigned: bool) -> GroupedPermission {
        GroupedPermission {
            id,
            title: format!("Permiso {id}"),
            description: String::new(),
            assigned,
        }
    }

    #[test]
    fn plan_reports_already_assigned_instead_of_failing() {
        let plan = plan_bulk(&set(&[1]), &set(&[1, 2]), &[1, 2], &[]).unwrap();
        assert_eq!(plan.assigned, vec![2]);
        assert_eq!(plan.already_assigned, vec![1]);
        assert!(plan.unassigned.is_empty());
    }

    #[test]
    fn plan_ignores_unknown_unassign_ids() {
        let plan = plan_bulk(&set(&[1, 2]), &set(&[]), &[], &[2, 99]).unwrap();
        assert_eq!(plan.unassigned, vec![2]);
        assert!(plan.assigned.is_empty());
    }

    #[test]
    fn plan_fails_on_unknown_assign_id() {
        let result = plan_bulk(&set(&[]), &set(&[1, 2]), &[1, 42, 2], &[]);
        assert_eq!(result, Err(AssignmentError::PermissionNotFound(42)));
    }

    #[test]
    fn plan_unassigns_before_assigning() {
        let plan = plan_bulk(&set(&[3]), &set(&[3]), &[3], &[3]).unwrap();
        assert_eq!(plan.unassigned, vec![3]);
        assert_eq!(plan.assigned, vec![3]);
        assert!(plan.already_assigned.is_empty());
    }

    #[test]
    fn plan_counts_repeated_ids_once() {
        let plan = plan_bulk(&set(&[]), &set(&[5]), &[5, 5], &[7, 7]).unwrap();
        assert_eq!(plan.assigned, vec![5]);
        assert_eq!(plan.already_assigned, vec![5]);
        assert!(plan.unassigned.is_empty());
    }

    #[test]
    fn grouping_keeps_empty_seed_categories() {
        let groups = group_by_category(
            &[category(1), category(2)],
            vec![
                (category(2), permission(10, true)),
                (category(2), permission(11, false)),
            ],
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category.id, 1);
        assert!(groups[0].permissions.is_empty());
        assert_eq!(groups[1].permissions.len(), 2);
        assert!(groups[1].permissions[0].assigned);
        assert!(!groups[1].permissions[1].assigned);
    }

    #[test]
    fn grouping_adds_unseeded_categories() {
        let groups = group_by_category(
            &[],
            vec![
                (category(4), permission(1, true)),
                (category(3), permission(2, true)),
                (category(4), permission(3, true)),
            ],
        );
        let ids: Vec<i64> = groups.iter().map(|group| group.category.id).collect();
        assert_eq!(ids, vec![4, 3]);
        assert_eq!(groups[0].permissions.len(), 2);
    }
}
