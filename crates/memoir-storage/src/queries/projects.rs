// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Project and membership operations.

use memoir_core::MemoirError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::{Project, ProjectMember};

/// Insert a new project and enroll the owner as a member.
pub async fn create_project(db: &Database, project: &Project) -> Result<(), MemoirError> {
    let project = project.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO projects (id, name, description, owner_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    project.id,
                    project.name,
                    project.description,
                    project.owner_id,
                    project.created_at,
                ],
            )?;
            tx.execute(
                "INSERT INTO project_members (project_id, user_id, role, created_at)
                 VALUES (?1, ?2, 'owner', ?3)",
                params![project.id, project.owner_id, project.created_at],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one project.
pub async fn get_project(db: &Database, id: &str) -> Result<Option<Project>, MemoirError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let project = conn
                .query_row(
                    "SELECT id, name, description, owner_id, created_at
                     FROM projects WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(Project {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            description: row.get(2)?,
                            owner_id: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(project)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Add a member to a project. Idempotent on the (project, user) pair.
pub async fn add_member(db: &Database, member: &ProjectMember) -> Result<(), MemoirError> {
    let member = member.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO project_members (project_id, user_id, role, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![member.project_id, member.user_id, member.role, member.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether the user is a member of the project.
pub async fn is_member(db: &Database, project_id: &str, user_id: &str) -> Result<bool, MemoirError> {
    let project_id = project_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM project_members WHERE project_id = ?1 AND user_id = ?2",
                params![project_id, user_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List members of a project.
pub async fn list_members(
    db: &Database,
    project_id: &str,
) -> Result<Vec<ProjectMember>, MemoirError> {
    let project_id = project_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT project_id, user_id, role, created_at
                 FROM project_members WHERE project_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![project_id], |row| {
                Ok(ProjectMember {
                    project_id: row.get(0)?,
                    user_id: row.get(1)?,
                    role: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?;
            let mut members = Vec::new();
            for row in rows {
                members.push(row?);
            }
            Ok(members)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users::create_user;
    use crate::queries::users::tests::make_user;
    use tempfile::tempdir;

    fn make_project(id: &str, owner: &str) -> Project {
        Project {
            id: id.to_string(),
            name: "Research".to_string(),
            description: Some("shared notes".to_string()),
            owner_id: owner.to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("p.db").to_str().unwrap())
            .await
            .unwrap();
        create_user(&db, &make_user("owner", "o@example.com")).await.unwrap();
        create_user(&db, &make_user("member", "m@example.com")).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_project_enrolls_owner() {
        let (db, _dir) = setup().await;
        create_project(&db, &make_project("p1", "owner")).await.unwrap();

        assert!(is_member(&db, "p1", "owner").await.unwrap());
        assert!(!is_member(&db, "p1", "member").await.unwrap());

        let fetched = get_project(&db, "p1").await.unwrap().unwrap();
        assert_eq!(fetched.name, "Research");
    }

    #[tokio::test]
    async fn add_member_is_idempotent() {
        let (db, _dir) = setup().await;
        create_project(&db, &make_project("p1", "owner")).await.unwrap();

        let m = ProjectMember {
            project_id: "p1".to_string(),
            user_id: "member".to_string(),
            role: "member".to_string(),
            created_at: "2026-01-02T00:00:00Z".to_string(),
        };
        add_member(&db, &m).await.unwrap();
        add_member(&db, &m).await.unwrap();

        let members = list_members(&db, "p1").await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(is_member(&db, "p1", "member").await.unwrap());
    }
}
