//! Workspace listing and membership handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    Extension, Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use taskhub_core::model::{MemberRole, User, Workspace, WorkspaceMember};
use taskhub_core::{AuthContext, TaskHubError};

use super::response::ApiError;
use super::server::AppState;
use crate::store::{self, NewMember};

/// Body of `POST /api/workspaces/add-member`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request fields that passed the presence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMemberParams {
    pub email: String,
    pub role: String,
    pub workspace_id: String,
    pub message: String,
}

/// Membership to create once every check passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberGrant {
    pub user_id: String,
    pub workspace_id: String,
    pub role: MemberRole,
    pub message: String,
}

fn present(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl AddMemberRequest {
    /// The invitee's email. Blank counts as missing.
    pub fn email(&self) -> Result<String, ApiError> {
        present(&self.email).ok_or_else(|| ApiError::bad_request("Missing required parameters!"))
    }

    /// Every field the membership needs. Blank strings count as missing.
    pub fn params(&self) -> Result<AddMemberParams, ApiError> {
        match (self.email(), present(&self.workspace_id), present(&self.role)) {
            (Ok(email), Some(workspace_id), Some(role)) => Ok(AddMemberParams {
                email,
                role,
                workspace_id,
                message: self.message.clone().unwrap_or_default(),
            }),
            _ => Err(ApiError::bad_request("Missing required parameters!")),
        }
    }
}

/// Decide whether `requester_id` may add `target` to `workspace`.
///
/// `target` is the user found by the request's email and `members` are the
/// current members of `workspace`. Checks run in a fixed order and the first
/// failure wins: email, invitee, remaining fields, role, workspace, admin
/// rights, existing membership.
pub fn authorize_add_member(
    request: &AddMemberRequest,
    requester_id: &str,
    target: Option<&User>,
    workspace: Option<&Workspace>,
    members: &[WorkspaceMember],
) -> Result<MemberGrant, ApiError> {
    request.email()?;

    let target = target.ok_or_else(|| ApiError::not_found("User not found!"))?;

    let params = request.params()?;

    let role = MemberRole::parse(&params.role).ok_or_else(|| ApiError::bad_request("Invalid role!"))?;

    let workspace = workspace.ok_or_else(|| ApiError::not_found("Workspace not found"))?;

    let requester_is_admin = members
        .iter()
        .any(|m| m.user_id == requester_id && m.role == MemberRole::Admin);
    if !requester_is_admin {
        return Err(ApiError::unauthorized("You don't have admin privileges"));
    }

    if members.iter().any(|m| m.user_id == target.id) {
        return Err(ApiError::bad_request("User is already a member"));
    }

    Ok(MemberGrant {
        user_id: target.id.clone(),
        workspace_id: workspace.id.clone(),
        role,
        message: params.message,
    })
}

/// `GET /api/workspaces`
pub async fn get_user_workspaces(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Value>, ApiError> {
    let user_id = auth.require_user_id()?;

    let workspaces = store::workspaces_for_user(state.db(), user_id)
        .await
        .map_err(|e| {
            tracing::error!(user_id, error = %e, "Failed to load workspaces");
            ApiError::internal()
        })?;

    Ok(Json(json!({ "success": true, "workspaces": workspaces })))
}

/// `POST /api/workspaces/add-member`
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    req: Request,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let requester_id = auth.require_user_id()?;

    let request = read_add_member_request(req).await?;
    let email = request.email()?;

    let pool = state.db();
    let target = store::find_user_by_email(pool, &email).await.map_err(internal)?;
    let workspace = match (&target, present(&request.workspace_id)) {
        (Some(_), Some(id)) => store::find_workspace(pool, &id).await.map_err(internal)?,
        _ => None,
    };
    let members = match &workspace {
        Some(w) => store::members_of_workspace(pool, &w.id).await.map_err(internal)?,
        None => Vec::new(),
    };

    let grant = authorize_add_member(
        &request,
        requester_id,
        target.as_ref(),
        workspace.as_ref(),
        &members,
    )?;

    let member = store::insert_member(
        pool,
        NewMember {
            user_id: &grant.user_id,
            workspace_id: &grant.workspace_id,
            role: grant.role,
            message: &grant.message,
        },
    )
    .await
    .map_err(|e| match e {
        // A concurrent request inserted the same membership first.
        e if e.is_unique_violation() => ApiError::bad_request("User is already a member"),
        e => internal(e),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "member": member,
            "message": "Member added successfully!",
        })),
    ))
}

/// Accepts JSON and urlencoded form bodies. An empty body has no fields.
async fn read_add_member_request(req: Request) -> Result<AddMemberRequest, ApiError> {
    let is_form = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(request) = Form::<AddMemberRequest>::from_request(req, &())
            .await
            .map_err(|e| match e.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::new(e.status(), e.body_text()),
                _ => ApiError::bad_request("Missing required parameters!"),
            })?;
        return Ok(request);
    }

    let body = Bytes::from_request(req, &())
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
    if body.is_empty() {
        return Ok(AddMemberRequest::default());
    }
    serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("Missing required parameters!"))
}

fn internal(err: TaskHubError) -> ApiError {
    tracing::error!(error = %err, "Add member failed");
    ApiError::internal()
}
