use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskHubError};
use crate::model::{MemberRole, NewWorkspace, UserProfile};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClerkEmailAddress {
    pub email_address: String,
}

/// `user.created` / `user.updated` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClerkUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ClerkUser {
    /// Display name from first and last name; absent parts are skipped.
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The first listed email address.
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .first()
            .map(|e| e.email_address.as_str())
    }

    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.primary_email().map(str::to_string),
            name: self.full_name(),
            image: self.image_url.clone().unwrap_or_default(),
        }
    }
}

/// Payload of `*.deleted` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClerkDeletedObject {
    pub id: String,
}

/// `organization.created` / `organization.updated` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClerkOrganization {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ClerkOrganization {
    /// Row for a newly created organization. The creator becomes the owner.
    pub fn to_new_workspace(&self) -> Result<NewWorkspace> {
        let owner_id = self.created_by.clone().ok_or_else(|| {
            TaskHubError::Validation(format!("Organization '{}' has no created_by", self.id))
        })?;

        Ok(NewWorkspace {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            owner_id,
            image_url: self.image_url.clone().unwrap_or_default(),
        })
    }
}

/// `organizationInvitation.accepted` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClerkInvitation {
    pub user_id: String,
    pub organization_id: String,
    pub role_name: String,
}

/// Map a provider role name (`org:admin`, `admin`, `ADMIN`) to a member role.
pub fn normalize_invitation_role(role_name: &str) -> Result<MemberRole> {
    let bare = role_name.trim();
    let bare = bare.strip_prefix("org:").unwrap_or(bare);
    MemberRole::parse(&bare.to_uppercase())
        .ok_or_else(|| TaskHubError::Validation(format!("Unknown role '{}'", role_name)))
}
