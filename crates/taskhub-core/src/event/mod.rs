//! Identity-provider events and the payload shapes the sync functions read.

mod payload;

pub use payload::{
    normalize_invitation_role, ClerkDeletedObject, ClerkEmailAddress, ClerkInvitation,
    ClerkOrganization, ClerkUser,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Result, TaskHubError};

/// Event names exactly as the provider integration emits them.
///
/// Two of them are irregular (`clerk.organization.updated` uses a dot,
/// `clerk/orgainzation.deleted` is misspelled); producers already send these
/// strings, so they must match byte for byte.
pub mod names {
    pub const USER_CREATED: &str = "clerk/user.created";
    pub const USER_DELETED: &str = "clerk/user.deleted";
    pub const USER_UPDATED: &str = "clerk/user.updated";
    pub const ORGANIZATION_CREATED: &str = "clerk/organization.created";
    pub const ORGANIZATION_UPDATED: &str = "clerk.organization.updated";
    pub const ORGANIZATION_DELETED: &str = "clerk/orgainzation.deleted";
    pub const INVITATION_ACCEPTED: &str = "clerk/organizationInvitation.accepted";
}

/// A named event carrying a provider-defined payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityEvent {
    /// Event name used for routing.
    pub name: String,
    /// Provider payload.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Delivery id assigned by the runner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Milliseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl IdentityEvent {
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data,
            id: None,
            ts: None,
        }
    }

    /// Deserialize the payload into a typed shape.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            TaskHubError::Validation(format!("Invalid payload for '{}': {}", self.name, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserialization() {
        let json = r#"{
            "name": "clerk/user.deleted",
            "data": {"id": "user_1", "deleted": true},
            "id": "01HXYZ",
            "ts": 1700000000000
        }"#;

        let event: IdentityEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.name, names::USER_DELETED);
        assert_eq!(event.id.as_deref(), Some("01HXYZ"));

        let deleted: ClerkDeletedObject = event.payload().unwrap();
        assert_eq!(deleted.id, "user_1");
    }

    #[test]
    fn test_payload_mismatch_is_validation_error() {
        let event = IdentityEvent::new(names::USER_DELETED, serde_json::json!({"nope": 1}));
        let err = event.payload::<ClerkDeletedObject>().unwrap_err();
        assert!(matches!(err, TaskHubError::Validation(_)));
    }

    #[test]
    fn test_irregular_names_are_preserved() {
        assert_eq!(names::ORGANIZATION_UPDATED, "clerk.organization.updated");
        assert_eq!(names::ORGANIZATION_DELETED, "clerk/orgainzation.deleted");
    }
}
