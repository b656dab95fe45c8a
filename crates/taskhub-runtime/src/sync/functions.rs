//! The built-in identity sync functions.
//!
//! Each one handles a single event and writes straight through: no
//! transaction around multi-row effects, no deduplication of redeliveries.
//! Failures propagate so the runner can retry the delivery.

use std::future::Future;
use std::pin::Pin;

use serde_json::{json, Value};

use taskhub_core::error::Result;
use taskhub_core::event::{
    names, normalize_invitation_role, ClerkDeletedObject, ClerkInvitation, ClerkOrganization,
    ClerkUser,
};
use taskhub_core::model::MemberRole;
use taskhub_core::IdentityEvent;

use super::context::SyncContext;
use super::registry::SyncRegistry;
use super::traits::{SyncFunction, SyncInfo};
use crate::store::{self, NewMember, WorkspaceUpdate};

type SyncFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

/// Register every built-in function.
pub fn register_builtin_functions(registry: &mut SyncRegistry) {
    registry.register::<SyncUserCreation>();
    registry.register::<SyncUserDeletion>();
    registry.register::<SyncUserUpdate>();
    registry.register::<SyncWorkspaceCreation>();
    registry.register::<SyncWorkspaceUpdate>();
    registry.register::<SyncWorkspaceDeletion>();
    registry.register::<SyncWorkspaceMemberCreation>();
}

/// Insert a user when the provider creates one.
pub struct SyncUserCreation;

impl SyncFunction for SyncUserCreation {
    fn info() -> SyncInfo {
        SyncInfo {
            id: "sync-user-from-clerk",
            name: "Sync user from Clerk",
            trigger: names::USER_CREATED,
        }
    }

    fn execute(ctx: &SyncContext, event: IdentityEvent) -> SyncFuture<'_> {
        Box::pin(async move {
            let data: ClerkUser = event.payload()?;
            let user = store::insert_user(ctx.db(), &data.to_profile()).await?;
            Ok(json!({ "userId": user.id }))
        })
    }
}

pub struct SyncUserDeletion;

impl SyncFunction for SyncUserDeletion {
    fn info() -> SyncInfo {
        SyncInfo {
            id: "delete-user-from-clerk",
            name: "Delete user from Clerk",
            trigger: names::USER_DELETED,
        }
    }

    fn execute(ctx: &SyncContext, event: IdentityEvent) -> SyncFuture<'_> {
        Box::pin(async move {
            let data: ClerkDeletedObject = event.payload()?;
            store::delete_user(ctx.db(), &data.id).await?;
            Ok(json!({ "userId": data.id, "deleted": true }))
        })
    }
}

pub struct SyncUserUpdate;

impl SyncFunction for SyncUserUpdate {
    fn info() -> SyncInfo {
        SyncInfo {
            id: "update-user-from-clerk",
            name: "Update user from Clerk",
            trigger: names::USER_UPDATED,
        }
    }

    fn execute(ctx: &SyncContext, event: IdentityEvent) -> SyncFuture<'_> {
        Box::pin(async move {
            let data: ClerkUser = event.payload()?;
            let user = store::update_user(ctx.db(), &data.to_profile()).await?;
            Ok(json!({ "userId": user.id }))
        })
    }
}

/// Insert a workspace for a new organization and make its creator an admin.
pub struct SyncWorkspaceCreation;

impl SyncFunction for SyncWorkspaceCreation {
    fn info() -> SyncInfo {
        SyncInfo {
            id: "sync-workspace-from-clerk",
            name: "Sync workspace from Clerk",
            trigger: names::ORGANIZATION_CREATED,
        }
    }

    fn execute(ctx: &SyncContext, event: IdentityEvent) -> SyncFuture<'_> {
        Box::pin(async move {
            let data: ClerkOrganization = event.payload()?;
            let new = data.to_new_workspace()?;

            let workspace = store::insert_workspace(ctx.db(), &new).await?;
            let member = store::insert_member(
                ctx.db(),
                NewMember {
                    user_id: &new.owner_id,
                    workspace_id: &workspace.id,
                    role: MemberRole::Admin,
                    message: "",
                },
            )
            .await?;

            Ok(json!({ "workspaceId": workspace.id, "memberId": member.id }))
        })
    }
}

// Trigger is "clerk.organization.updated" (dot, not slash).
pub struct SyncWorkspaceUpdate;

impl SyncFunction for SyncWorkspaceUpdate {
    fn info() -> SyncInfo {
        SyncInfo {
            id: "update-workpace-from-clerk",
            name: "Update workspace from Clerk",
            trigger: names::ORGANIZATION_UPDATED,
        }
    }

    fn execute(ctx: &SyncContext, event: IdentityEvent) -> SyncFuture<'_> {
        Box::pin(async move {
            let data: ClerkOrganization = event.payload()?;
            let workspace = store::update_workspace(
                ctx.db(),
                &data.id,
                WorkspaceUpdate {
                    name: &data.name,
                    slug: &data.slug,
                    image_url: data.image_url.as_deref().unwrap_or_default(),
                },
            )
            .await?;

            Ok(json!({ "workspaceId": workspace.id }))
        })
    }
}

// Trigger is "clerk/orgainzation.deleted" (misspelled upstream).
pub struct SyncWorkspaceDeletion;

impl SyncFunction for SyncWorkspaceDeletion {
    fn info() -> SyncInfo {
        SyncInfo {
            id: "delete-workpace-from-clerk",
            name: "Delete workspace from Clerk",
            trigger: names::ORGANIZATION_DELETED,
        }
    }

    fn execute(ctx: &SyncContext, event: IdentityEvent) -> SyncFuture<'_> {
        Box::pin(async move {
            let data: ClerkDeletedObject = event.payload()?;
            store::delete_workspace(ctx.db(), &data.id).await?;
            Ok(json!({ "workspaceId": data.id, "deleted": true }))
        })
    }
}

/// Add the invitee to the workspace once an invitation is accepted.
pub struct SyncWorkspaceMemberCreation;

impl SyncFunction for SyncWorkspaceMemberCreation {
    fn info() -> SyncInfo {
        SyncInfo {
            id: "sync-workspace-member-from-clerk",
            name: "Sync workspace member from Clerk",
            trigger: names::INVITATION_ACCEPTED,
        }
    }

    fn execute(ctx: &SyncContext, event: IdentityEvent) -> SyncFuture<'_> {
        Box::pin(async move {
            let data: ClerkInvitation = event.payload()?;
            let role = normalize_invitation_role(&data.role_name)?;

            let member = store::insert_member(
                ctx.db(),
                NewMember {
                    user_id: &data.user_id,
                    workspace_id: &data.organization_id,
                    role,
                    message: "",
                },
            )
            .await?;

            Ok(json!({ "memberId": member.id, "role": member.role }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhub_core::TaskHubError;

    fn lazy_ctx() -> SyncContext {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(std::time::Duration::from_millis(100))
            .connect_lazy("postgres://localhost:1/nonexistent")
            .expect("Failed to create lazy pool");
        SyncContext::new(pool)
    }

    // Payload validation runs before any query, so these never reach the pool.

    #[tokio::test]
    async fn test_user_creation_rejects_malformed_payload() {
        let ctx = lazy_ctx();
        let event = IdentityEvent::new(names::USER_CREATED, json!({ "first_name": "NoId" }));
        let err = SyncUserCreation::execute(&ctx, event).await.unwrap_err();
        assert!(matches!(err, TaskHubError::Validation(_)));
    }

    #[tokio::test]
    async fn test_workspace_creation_requires_creator() {
        let ctx = lazy_ctx();
        let event = IdentityEvent::new(
            names::ORGANIZATION_CREATED,
            json!({ "id": "org_1", "name": "Acme", "slug": "acme" }),
        );
        let err = SyncWorkspaceCreation::execute(&ctx, event).await.unwrap_err();
        assert!(matches!(err, TaskHubError::Validation(_)));
    }

    #[tokio::test]
    async fn test_member_creation_rejects_unknown_role() {
        let ctx = lazy_ctx();
        let event = IdentityEvent::new(
            names::INVITATION_ACCEPTED,
            json!({
                "user_id": "user_1",
                "organization_id": "org_1",
                "role_name": "org:billing_manager"
            }),
        );
        let err = SyncWorkspaceMemberCreation::execute(&ctx, event)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskHubError::Validation(_)));
    }

    #[test]
    fn test_function_ids_are_unique() {
        let registry = SyncRegistry::with_builtin_functions();
        let ids: std::collections::HashSet<_> =
            registry.infos().into_iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 7);
    }
}
