//! Role Gate: server-side authorization of pipeline roles
//!
//! Every caller names a role and submits a credential. The gate answers allow or
//! deny before any pipeline operation touches the store. The policy is a trait so
//! the credential check can be replaced without touching pipeline logic.
//!
//! # Credential store
//!
//! - Table: `role_credentials (role, credential_hash)`
//! - Only SHA-256 digests are stored, never the access codes themselves
//! - Missing roles get a random access code on first load, logged once

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

const GENERATED_CODE_LEN: usize = 12;

// ========================================
// Roles and decisions
// ========================================

/// Business roles acting on the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Marketing,
    Salesperson,
    Measurement,
    Manufacturer,
    Delivery,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Owner,
        Role::Marketing,
        Role::Salesperson,
        Role::Measurement,
        Role::Manufacturer,
        Role::Delivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Marketing => "marketing",
            Role::Salesperson => "salesperson",
            Role::Measurement => "measurement",
            Role::Manufacturer => "manufacturer",
            Role::Delivery => "delivery",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::ValidationFailed(format!("Unknown role: {:?}", s)))
    }
}

/// Gate answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny,
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Authorization policy consulted before every pipeline operation
pub trait RoleGate: Send + Sync {
    fn authorize(&self, role: Role, credential: &str) -> GateDecision;
}

// ========================================
// Policies
// ========================================

/// Allows everything; used when authentication is switched off in config
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl RoleGate for OpenGate {
    fn authorize(&self, _role: Role, _credential: &str) -> GateDecision {
        GateDecision::Allow
    }
}

/// Compares the digest of the submitted credential with the stored digest per role
#[derive(Debug, Clone, Default)]
pub struct CredentialGate {
    digests: HashMap<Role, String>,
}

impl CredentialGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain access code for a role (hashed immediately)
    pub fn with_credential(mut self, role: Role, credential: &str) -> Self {
        self.digests.insert(role, credential_digest(role, credential));
        self
    }

    fn with_digest(mut self, role: Role, digest: String) -> Self {
        self.digests.insert(role, digest);
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.digests.contains_key(&role)
    }
}

impl RoleGate for CredentialGate {
    fn authorize(&self, role: Role, credential: &str) -> GateDecision {
        if credential.trim().is_empty() {
            return GateDecision::Deny;
        }

        match self.digests.get(&role) {
            Some(expected) if digests_match(expected, &credential_digest(role, credential)) => {
                GateDecision::Allow
            }
            _ => GateDecision::Deny,
        }
    }
}

/// Compare two digests without short-circuiting on the first differing byte
fn digests_match(expected: &str, submitted: &str) -> bool {
    let (expected, submitted) = (expected.as_bytes(), submitted.as_bytes());
    if expected.len() != submitted.len() {
        return false;
    }
    expected
        .iter()
        .zip(submitted)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// SHA-256 of `role:credential`, as 64 hex characters
///
/// The role is part of the input so one code cannot be replayed for another role's
/// digest.
pub fn credential_digest(role: Role, credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(role.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(credential.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ========================================
// Credential store
// ========================================

/// Store (or replace) the access code for a role
pub async fn set_role_credential(pool: &SqlitePool, role: Role, credential: &str) -> Result<()> {
    if credential.trim().is_empty() {
        return Err(Error::ValidationFailed(
            "access code must not be blank".to_string(),
        ));
    }

    sqlx::query(
        r#"
        INSERT INTO role_credentials (role, credential_hash, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(role) DO UPDATE SET
            credential_hash = excluded.credential_hash,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(role.as_str())
    .bind(credential_digest(role, credential))
    .execute(pool)
    .await?;

    info!("Access code updated for role '{}'", role);
    Ok(())
}

/// Build a [`CredentialGate`] from the store
///
/// Any role without a stored digest receives a freshly generated access code,
/// which is logged once at WARN so the operator can distribute it.
pub async fn load_credential_gate(pool: &SqlitePool) -> Result<CredentialGate> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT role, credential_hash FROM role_credentials")
            .fetch_all(pool)
            .await?;

    let mut gate = CredentialGate::new();
    for (role_name, digest) in rows {
        match role_name.parse::<Role>() {
            Ok(role) => gate = gate.with_digest(role, digest),
            Err(_) => warn!("Ignoring credential for unknown role '{}'", role_name),
        }
    }

    for role in Role::ALL {
        if gate.has_role(role) {
            continue;
        }

        let code = generate_access_code();
        // INSERT OR IGNORE: a concurrent startup may have seeded this role already
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO role_credentials (role, credential_hash) VALUES (?, ?)",
        )
        .bind(role.as_str())
        .bind(credential_digest(role, &code))
        .execute(pool)
        .await?
        .rows_affected();

        if inserted == 1 {
            warn!("Generated access code for role '{}': {}", role, code);
            gate = gate.with_credential(role, &code);
        } else {
            let digest: String =
                sqlx::query_scalar("SELECT credential_hash FROM role_credentials WHERE role = ?")
                    .bind(role.as_str())
                    .fetch_one(pool)
                    .await?;
            gate = gate.with_digest(role, digest);
        }
    }

    Ok(gate)
}

fn generate_access_code() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_CODE_LEN)
        .map(char::from)
        .collect()
}
