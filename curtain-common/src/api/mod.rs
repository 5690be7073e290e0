//! Role Gate shared by every pipeline surface
//!
//! Contains ONLY the policy and its credential store (via sqlx). HTTP framework
//! glue lives in the service crate.

pub mod auth;

pub use auth::{
    credential_digest, load_credential_gate, set_role_credential, CredentialGate,
    GateDecision, OpenGate, Role, RoleGate,
};
