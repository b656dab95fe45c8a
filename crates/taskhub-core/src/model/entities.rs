use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::{MemberRole, Priority, ProjectStatus, TaskStatus, TaskType};

/// A user mirrored from the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The user fields the identity provider owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: String,
    pub image: String,
}

/// A tenant: groups members and projects.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub settings: serde_json::Value,
    pub owner_id: String,
    #[serde(rename = "image_url")]
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Workspace fields taken from an organization payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkspace {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub owner_id: String,
    pub image_url: String,
}

/// Membership of a user in a workspace.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    pub id: Uuid,
    pub user_id: String,
    pub workspace_id: String,
    pub message: String,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: ProjectStatus,
    #[serde(rename = "start_date")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "end_date")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "team_lead")]
    pub team_lead: String,
    pub workspace_id: String,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: TaskType,
    pub priority: Priority,
    pub assignee_id: Option<String>,
    #[serde(rename = "due_date")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub user_id: String,
    pub task_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_workspace() -> Workspace {
        Workspace {
            id: "org_1".into(),
            name: "Acme".into(),
            slug: "acme".into(),
            description: None,
            settings: serde_json::json!({}),
            owner_id: "user_1".into(),
            image_url: "https://img.example.com/acme.png".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_workspace_keeps_image_url_key() {
        let json = serde_json::to_value(sample_workspace()).unwrap();
        assert_eq!(json["ownerId"], "user_1");
        assert_eq!(json["image_url"], "https://img.example.com/acme.png");
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_task_serializes_type_and_due_date() {
        let task = Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Ship it".into(),
            description: None,
            status: TaskStatus::Todo,
            kind: TaskType::Bug,
            priority: Priority::High,
            assignee_id: Some("user_2".into()),
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(task).unwrap();
        assert_eq!(json["type"], "BUG");
        assert_eq!(json["assigneeId"], "user_2");
        assert!(json.get("due_date").is_some());
    }
}
