//! Identity-event sync: one-shot functions that mirror provider events into
//! the local tables, a registry to look them up by id or trigger, and the
//! request signature check used by the dispatch endpoint.

mod context;
mod functions;
mod registry;
mod signature;
mod traits;

pub use context::SyncContext;
pub use functions::{
    register_builtin_functions, SyncUserCreation, SyncUserDeletion, SyncUserUpdate,
    SyncWorkspaceCreation, SyncWorkspaceDeletion, SyncWorkspaceMemberCreation,
    SyncWorkspaceUpdate,
};
pub use registry::{SyncEntry, SyncRegistry};
pub use signature::{sign, verify_signature, SignatureError, SIGNATURE_HEADER};
pub use traits::{SyncFunction, SyncInfo};
