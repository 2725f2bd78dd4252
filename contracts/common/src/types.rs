//! Core Types for the Yield Custody Vault
//!
//! Fundamental data structures shared by the vault contract, its host
//! adapter, and the in-memory collaborators.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Type alias for addresses (32-byte account identifier)
pub type Address = [u8; 32];

/// Type alias for hashed role identifiers
pub type RoleId = [u8; 32];

/// Type alias for 4-byte interface identifiers
pub type InterfaceId = [u8; 4];

/// The all-zero address
pub const ZERO_ADDRESS: Address = [0u8; 32];

// ============ Role Types ============

/// Named capabilities granting access to a subset of operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Role {
    /// Grants/revokes roles, mutates registry and configuration, upgrades
    Admin,
    /// Deposits the custody asset into the yield pool
    Minter,
    /// Redeems from the yield pool, runs batch maintenance
    Operator,
}

impl Role {
    /// All roles, in grant order used at initialization
    pub const ALL: [Role; 3] = [Role::Admin, Role::Minter, Role::Operator];

    /// Canonical role name, hashed into the role id
    pub fn name(&self) -> &'static str {
        use crate::constants::roles;
        match self {
            Role::Admin => roles::ADMIN_ROLE,
            Role::Minter => roles::MINTER_ROLE,
            Role::Operator => roles::OPERATOR_ROLE,
        }
    }

    /// Compact tag used by witness encodings
    pub fn tag(&self) -> u8 {
        match self {
            Role::Admin => 0,
            Role::Minter => 1,
            Role::Operator => 2,
        }
    }

    /// Inverse of [`Role::tag`]
    pub fn from_tag(tag: u8) -> Option<Role> {
        match tag {
            0 => Some(Role::Admin),
            1 => Some(Role::Minter),
            2 => Some(Role::Operator),
            _ => None,
        }
    }
}

// ============ Endpoint Types ============

/// External contracts the vault talks to, fixed at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AssetEndpoints {
    /// Custody asset (stablecoin) contract
    pub custody_asset: Address,
    /// Yield pool (lending market) contract
    pub yield_pool: Address,
}

impl AssetEndpoints {
    pub fn new(custody_asset: Address, yield_pool: Address) -> Self {
        Self { custody_asset, yield_pool }
    }
}

/// Yield pool entry points, used to tag pool failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolOperation {
    Mint,
    Redeem,
    RedeemUnderlying,
}

// ============ Action Types ============

/// State-changing operations of the custody vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum CustodyAction {
    /// One-time setup: store endpoints, grant all roles to the caller
    Initialize { custody_asset: Address, yield_pool: Address },
    /// Grant a role (admin only)
    GrantRole { role: Role, account: Address },
    /// Revoke a role (admin only)
    RevokeRole { role: Role, account: Address },
    /// Drop one of the caller's own roles
    RenounceRole { role: Role },
    /// Deposit caller's funds, tagged with a pool id
    Mint { pool_id: u64, amount: u128 },
    /// Deposit caller's funds, tagged with a holder
    MintForHolder { holder: Address, amount: u128 },
    /// Deposit funds pulled from `from`, tagged with a pool id
    MintFrom { pool_id: u64, amount: u128, from: Address },
    /// Redeem pool tokens for underlying
    Redeem { amount: u128 },
    /// Redeem an exact amount of underlying
    RedeemUnderlying { amount: u128 },
    /// Replace the holder registry
    SetHolders { holders: Vec<Address> },
    /// Overwrite the token identifier
    SetTokenId { token_id: u64 },
    /// Batch maintenance placeholder (no observable effect)
    BatchAddHolder { size: u64 },
    /// Upgrade authorization hook
    AuthorizeUpgrade { new_implementation: Address },
    /// Authorize and record a new implementation
    UpgradeTo { new_implementation: Address },
}

impl CustodyAction {
    /// Role the caller must hold, `None` for initialize/renounce
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Self::Initialize { .. } | Self::RenounceRole { .. } => None,
            Self::Mint { .. } | Self::MintForHolder { .. } | Self::MintFrom { .. } => {
                Some(Role::Minter)
            }
            Self::Redeem { .. } | Self::RedeemUnderlying { .. } | Self::BatchAddHolder { .. } => {
                Some(Role::Operator)
            }
            Self::GrantRole { .. }
            | Self::RevokeRole { .. }
            | Self::SetHolders { .. }
            | Self::SetTokenId { .. }
            | Self::AuthorizeUpgrade { .. }
            | Self::UpgradeTo { .. } => Some(Role::Admin),
        }
    }

    /// True when the action calls out to the custody asset or yield pool
    pub fn touches_collaborators(&self) -> bool {
        matches!(
            self,
            Self::Mint { .. }
                | Self::MintForHolder { .. }
                | Self::MintFrom { .. }
                | Self::Redeem { .. }
                | Self::RedeemUnderlying { .. }
        )
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::GrantRole { .. } => "grant_role",
            Self::RevokeRole { .. } => "revoke_role",
            Self::RenounceRole { .. } => "renounce_role",
            Self::Mint { .. } => "mint",
            Self::MintForHolder { .. } => "mint_for_holder",
            Self::MintFrom { .. } => "mint_from",
            Self::Redeem { .. } => "redeem",
            Self::RedeemUnderlying { .. } => "redeem_underlying",
            Self::SetHolders { .. } => "set_holders",
            Self::SetTokenId { .. } => "set_token_id",
            Self::BatchAddHolder { .. } => "batch_add_holder",
            Self::AuthorizeUpgrade { .. } => "authorize_upgrade",
            Self::UpgradeTo { .. } => "upgrade_to",
        }
    }
}

/// A call submitted to the vault: who, when, and what
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CustodyCall {
    /// Submitting account (message sender)
    pub caller: Address,
    /// Block height at which the call executes
    pub block_height: u64,
    /// Requested operation
    pub action: CustodyAction,
}

impl CustodyCall {
    pub fn new(caller: Address, block_height: u64, action: CustodyAction) -> Self {
        Self { caller, block_height, action }
    }
}
