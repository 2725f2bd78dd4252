//! Access Control Module
//!
//! Role-based access control for the custody vault.
//!
//! ## Rules
//!
//! - Three roles: `Admin`, `Minter`, `Operator`
//! - `Admin` is the admin of every role: only admins grant or revoke
//! - Membership is a set: granting a held role or revoking an unheld
//!   one is a no-op, not an error
//! - Any account may renounce its own roles

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::interface_signatures;
use crate::errors::{CustodyError, CustodyResult};
use crate::types::{Address, InterfaceId, Role, RoleId};
use crate::Vec;

// ============================================================================
// Types
// ============================================================================

/// Role membership for an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoleAssignment {
    /// Address with the role
    pub address: Address,
    /// Assigned role
    pub role: Role,
    /// Block when role was granted
    pub granted_at: u64,
    /// Address that granted the role
    pub granted_by: Address,
}

impl RoleAssignment {
    /// Create new role assignment
    pub fn new(address: Address, role: Role, granted_by: Address, block: u64) -> Self {
        Self {
            address,
            role,
            granted_at: block,
            granted_by,
        }
    }
}

/// Access control state: the role table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccessControlState {
    /// Current role memberships, at most one per (address, role)
    pub roles: Vec<RoleAssignment>,
    /// Last update block
    pub last_update_block: u64,
}

impl AccessControlState {
    /// Create an empty role table
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Core Access Control Functions
// ============================================================================

/// Check if address has a specific role
pub fn has_role(state: &AccessControlState, address: &Address, role: Role) -> bool {
    state
        .roles
        .iter()
        .any(|r| r.address == *address && r.role == role)
}

/// Fail with `Unauthorized` unless `caller` holds `role`
pub fn require_role(state: &AccessControlState, caller: &Address, role: Role) -> CustodyResult<()> {
    if has_role(state, caller, role) {
        Ok(())
    } else {
        Err(CustodyError::Unauthorized { caller: *caller, role })
    }
}

/// Role whose holders may grant and revoke `role`
pub fn role_admin(_role: Role) -> Role {
    Role::Admin
}

/// Add `role` to `grantee` without an authorization check.
///
/// Returns true if membership changed.
pub fn insert_role(
    state: &mut AccessControlState,
    granter: Address,
    grantee: Address,
    role: Role,
    current_block: u64,
) -> bool {
    if has_role(state, &grantee, role) {
        return false;
    }
    state
        .roles
        .push(RoleAssignment::new(grantee, role, granter, current_block));
    state.last_update_block = current_block;
    true
}

/// Remove `role` from `target` without an authorization check.
///
/// Returns true if membership changed.
pub fn remove_role(
    state: &mut AccessControlState,
    target: &Address,
    role: Role,
    current_block: u64,
) -> bool {
    let before = state.roles.len();
    state
        .roles
        .retain(|r| !(r.address == *target && r.role == role));
    let changed = state.roles.len() != before;
    if changed {
        state.last_update_block = current_block;
    }
    changed
}

/// Grant a role to an address.
///
/// Returns true if membership changed, false if already held.
pub fn grant_role(
    state: &mut AccessControlState,
    granter: Address,
    grantee: Address,
    role: Role,
    current_block: u64,
) -> CustodyResult<bool> {
    require_role(state, &granter, role_admin(role))?;
    Ok(insert_role(state, granter, grantee, role, current_block))
}

/// Revoke a role from an address.
///
/// Returns true if membership changed, false if the role was not held.
pub fn revoke_role(
    state: &mut AccessControlState,
    revoker: Address,
    target: Address,
    role: Role,
    current_block: u64,
) -> CustodyResult<bool> {
    require_role(state, &revoker, role_admin(role))?;
    Ok(remove_role(state, &target, role, current_block))
}

/// Drop one of the caller's own roles. Returns true if membership changed.
pub fn renounce_role(
    state: &mut AccessControlState,
    account: Address,
    role: Role,
    current_block: u64,
) -> bool {
    remove_role(state, &account, role, current_block)
}

/// Get all holders of a role, in grant order
pub fn role_members(state: &AccessControlState, role: Role) -> Vec<Address> {
    state
        .roles
        .iter()
        .filter(|r| r.role == role)
        .map(|r| r.address)
        .collect()
}

// ============================================================================
// Identifiers
// ============================================================================

/// 32-byte role identifier: SHA-256 of the canonical role name
pub fn role_id(role: Role) -> RoleId {
    let mut hasher = Sha256::new();
    hasher.update(role.name().as_bytes());
    let result = hasher.finalize();
    let mut id = [0u8; 32];
    id.copy_from_slice(&result);
    id
}

/// 4-byte selector of an operation signature
pub fn selector(signature: &str) -> InterfaceId {
    let digest = Sha256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Interface id: XOR of the selectors of its member operations
pub fn interface_id(signatures: &[&str]) -> InterfaceId {
    signatures.iter().fold([0u8; 4], |mut acc, sig| {
        let sel = selector(sig);
        for (a, s) in acc.iter_mut().zip(sel.iter()) {
            *a ^= s;
        }
        acc
    })
}

/// Capability introspection for the access-control interface set
pub fn supports_access_control_interface(id: &InterfaceId) -> bool {
    *id == interface_id(interface_signatures::ACCESS_CONTROL)
        || *id == interface_id(interface_signatures::INTROSPECTION)
}

// ============================================================================
// Tests
// ============================================================================
