use std::collections::{HashMap, HashSet};

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::permissions::PermissionGroup;

/// Names of every group the user belongs to.
pub async fn group_memberships(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<HashSet<String>, AppError> {
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT pg.name FROM group_members gm \
         JOIN permission_groups pg ON gm.group_id = pg.id \
         WHERE gm.user_id = ?",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

pub async fn nodes_for_group(pool: &SqlitePool, name: &str) -> Result<HashSet<String>, AppError> {
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT pn.node FROM permission_nodes pn \
         JOIN permission_groups pg ON pn.group_id = pg.id \
         WHERE pg.name = ?",
    )
    .bind(name)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Every group with its nodes, in one pass. Left join so node-less groups
/// still come back, since an empty group is valid configuration.
pub async fn load_groups(pool: &SqlitePool) -> Result<HashMap<String, PermissionGroup>, AppError> {
    let rows = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT pg.name, pn.node FROM permission_groups pg \
         LEFT JOIN permission_nodes pn ON pn.group_id = pg.id",
    )
    .fetch_all(pool)
    .await?;

    let mut groups: HashMap<String, PermissionGroup> = HashMap::new();
    for (name, node) in rows {
        let group = groups
            .entry(name.clone())
            .or_insert_with(|| PermissionGroup::new(&name));
        if let Some(node) = node {
            group.add_node(&node);
        }
    }
    Ok(groups)
}

pub async fn create_group(
    pool: &SqlitePool,
    name: &str,
    nodes: &[&str],
) -> Result<i64, AppError> {
    let result = sqlx::query("INSERT INTO permission_groups (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;
    let group_id = result.last_insert_rowid();
    for node in nodes {
        sqlx::query("INSERT INTO permission_nodes (group_id, node) VALUES (?, ?)")
            .bind(group_id)
            .bind(node)
            .execute(pool)
            .await?;
    }
    Ok(group_id)
}

/// Referencing a group that does not exist is a configuration error, not a
/// silent no-op.
pub async fn add_member(pool: &SqlitePool, user_id: i64, group_name: &str) -> Result<(), AppError> {
    let result = sqlx::query(
        "INSERT INTO group_members (user_id, group_id) \
         SELECT ?, id FROM permission_groups WHERE name = ?",
    )
    .bind(user_id)
    .bind(group_name)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::GroupNotFound(group_name.to_string()));
    }
    Ok(())
}
