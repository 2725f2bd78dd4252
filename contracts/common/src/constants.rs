//! Protocol Constants
//!
//! Compile-time configuration for the yield custody vault: role names,
//! fixed-point scale, yield pool status codes, and the operation
//! signatures that make up each advertised interface.

/// Role names, hashed into 32-byte role identifiers
pub mod roles {
    /// Administrator: grants/revokes roles, mutates registry and config
    pub const ADMIN_ROLE: &str = "ADMIN_ROLE";
    /// Minter: deposits the custody asset into the yield pool
    pub const MINTER_ROLE: &str = "MINTER_ROLE";
    /// Operator: redeems from the yield pool
    pub const OPERATOR_ROLE: &str = "OPERATOR_ROLE";
}

/// Fixed-point precision
pub mod precision {
    /// Exchange rates are expressed as mantissas scaled by 1e18
    pub const EXP_SCALE: u128 = 1_000_000_000_000_000_000; // 1e18
}

/// Yield pool status codes
///
/// The pool reports failures as return codes instead of aborting.
/// Numbering follows the lending protocol's token error reporter.
pub mod pool_status {
    pub const NO_ERROR: u64 = 0;
    pub const BAD_INPUT: u64 = 2;
    pub const MATH_ERROR: u64 = 9;
    pub const TOKEN_INSUFFICIENT_ALLOWANCE: u64 = 12;
    pub const TOKEN_INSUFFICIENT_BALANCE: u64 = 13;
    pub const TOKEN_INSUFFICIENT_CASH: u64 = 14;
    pub const TOKEN_TRANSFER_IN_FAILED: u64 = 15;
    pub const TOKEN_TRANSFER_OUT_FAILED: u64 = 16;
}

/// In-memory yield pool defaults
pub mod memory_pool {
    /// Initial exchange rate mantissa (0.02 underlying per pool token)
    pub const INITIAL_EXCHANGE_RATE: u128 = 20_000_000_000_000_000; // 2e16
}

/// Operation signatures per advertised interface.
///
/// An interface id is the XOR of the 4-byte selectors of its members.
pub mod interface_signatures {
    /// Capability introspection
    pub const INTROSPECTION: &[&str] = &["supportsInterface(bytes4)"];

    /// Role-based access control
    pub const ACCESS_CONTROL: &[&str] = &[
        "hasRole(bytes32,address)",
        "getRoleAdmin(bytes32)",
        "grantRole(bytes32,address)",
        "revokeRole(bytes32,address)",
        "renounceRole(bytes32,address)",
    ];

    /// Custody vault surface
    pub const CUSTODY_VAULT: &[&str] = &[
        "mint(uint256,uint256)",
        "mint(address,uint256)",
        "mint(uint256,uint256,address)",
        "redeem(uint256)",
        "redeemUnderlying(uint256)",
        "setHolders(address[])",
        "setTokenId(uint256)",
        "getHolders()",
        "getHolder(uint256)",
        "getHoldersCount()",
        "batchAddHolder(uint256)",
    ];
}
