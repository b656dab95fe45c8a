mod auth;
mod inngest;
mod response;
mod server;
mod tracing;
mod workspaces;

pub use auth::{auth_middleware, extract_auth_context, require_auth, AuthError, AuthMiddleware};
pub use inngest::{InvokeBody, Introspection, RunContext};
pub use response::{ApiError, ErrorBody, INTERNAL_ERROR_MESSAGE};
pub use server::{AppState, GatewayServer, HealthResponse};
pub use tracing::{TracingState, REQUEST_ID_HEADER, TRACE_ID_HEADER};
pub use workspaces::{authorize_add_member, AddMemberParams, AddMemberRequest, MemberGrant};
