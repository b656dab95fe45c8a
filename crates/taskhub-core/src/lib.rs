pub mod auth;
pub mod config;
pub mod error;
pub mod event;
pub mod model;

pub use auth::{AuthContext, Claims, ClaimsBuilder};
pub use config::TaskHubConfig;
pub use error::{Result, TaskHubError};
pub use event::IdentityEvent;
pub use model::{MemberRole, User, Workspace, WorkspaceMember};
