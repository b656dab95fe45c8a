use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Role of a user inside a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "workspace_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    /// Parse the wire representation. Matching is exact: `"admin"` is not a role.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Self::Admin),
            "MEMBER" => Some(Self::Member),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }
}

impl Default for MemberRole {
    fn default() -> Self {
        Self::Member
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "project_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Active,
    Planning,
    Completed,
    OnHold,
    Cancelled,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Priority shared by projects and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "priority", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Task progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Todo
    }
}

/// Kind of work a task tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "task_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Task,
    Bug,
    Feature,
    Improvement,
    Other,
}

impl Default for TaskType {
    fn default() -> Self {
        Self::Task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_parse_is_exact() {
        assert_eq!(MemberRole::parse("ADMIN"), Some(MemberRole::Admin));
        assert_eq!(MemberRole::parse("MEMBER"), Some(MemberRole::Member));
        assert_eq!(MemberRole::parse("admin"), None);
        assert_eq!(MemberRole::parse("OWNER"), None);
        assert_eq!(MemberRole::parse(""), None);
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(serde_json::to_string(&MemberRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::to_string(&ProjectStatus::OnHold).unwrap(),
            "\"ON_HOLD\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        let t: TaskType = serde_json::from_str("\"IMPROVEMENT\"").unwrap();
        assert_eq!(t, TaskType::Improvement);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(MemberRole::default(), MemberRole::Member);
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
    }
}
