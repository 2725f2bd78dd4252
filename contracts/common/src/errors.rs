//! Error Types for the Yield Custody Vault
//!
//! Every failure aborts the whole call; nothing is recovered locally.
//! Each variant carries a stable error code for logging and indexing.

use core::fmt;

use crate::types::{Address, PoolOperation, Role};

/// Result type alias for custody vault operations
pub type CustodyResult<T> = Result<T, CustodyError>;

/// Main error enum for all custody vault errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    // ============ Authorization Errors ============
    /// Caller does not hold the role the operation requires
    Unauthorized { caller: Address, role: Role },

    /// Re-entry into a custody operation while one is in progress
    ReentrantCall,

    // ============ Lifecycle Errors ============
    /// `initialize` was already consumed on this instance
    AlreadyInitialized,

    /// Operation requires an initialized instance
    NotInitialized,

    // ============ Registry Errors ============
    /// Holder index past the end of the registry
    IndexOutOfBounds { index: u64, len: u64 },

    // ============ Collaborator Errors ============
    /// Custody asset rejected a pull: balance or allowance too low
    InsufficientBalanceOrAllowance {
        account: Address,
        available: u128,
        requested: u128,
    },

    /// Yield pool returned a non-zero status code
    PoolOperationFailed { operation: PoolOperation, code: u64 },

    /// Injected collaborator does not match the configured endpoint
    EndpointMismatch { expected: Address, actual: Address },

    // ============ Input Validation Errors ============
    /// Invalid address (e.g., zero address)
    InvalidAddress {
        /// Description of why the address is invalid
        reason: &'static str,
    },

    /// Witness payload could not be decoded into a call
    InvalidWitness,

    /// Output state is not the input state with the call applied
    InvalidStateTransition,

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Division by zero
    DivisionByZero,
}

impl CustodyError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "E001_UNAUTHORIZED",
            Self::ReentrantCall => "E002_REENTRANT_CALL",
            Self::AlreadyInitialized => "E010_ALREADY_INITIALIZED",
            Self::NotInitialized => "E011_NOT_INITIALIZED",
            Self::IndexOutOfBounds { .. } => "E020_INDEX_OUT_OF_BOUNDS",
            Self::InsufficientBalanceOrAllowance { .. } => "E030_INSUFFICIENT_BALANCE_OR_ALLOWANCE",
            Self::PoolOperationFailed { .. } => "E031_POOL_OPERATION_FAILED",
            Self::EndpointMismatch { .. } => "E032_ENDPOINT_MISMATCH",
            Self::InvalidAddress { .. } => "E040_INVALID_ADDRESS",
            Self::InvalidWitness => "E041_INVALID_WITNESS",
            Self::InvalidStateTransition => "E042_INVALID_STATE_TRANSITION",
            Self::Overflow => "E050_OVERFLOW",
            Self::DivisionByZero => "E051_DIV_ZERO",
        }
    }

    /// Returns true if the caller can fix the condition and resubmit
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalanceOrAllowance { .. } | Self::PoolOperationFailed { .. }
        )
    }
}

impl fmt::Display for CustodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized { role, .. } => {
                write!(f, "{}: caller lacks {}", self.code(), role.name())
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "{}: index {} >= {}", self.code(), index, len)
            }
            Self::InsufficientBalanceOrAllowance { available, requested, .. } => {
                write!(f, "{}: available {}, requested {}", self.code(), available, requested)
            }
            Self::PoolOperationFailed { operation, code } => {
                write!(f, "{}: {:?} returned {}", self.code(), operation, code)
            }
            Self::InvalidAddress { reason } => write!(f, "{}: {}", self.code(), reason),
            _ => f.write_str(self.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            CustodyError::Unauthorized { caller: [0u8; 32], role: Role::Admin },
            CustodyError::ReentrantCall,
            CustodyError::AlreadyInitialized,
            CustodyError::NotInitialized,
            CustodyError::IndexOutOfBounds { index: 2, len: 2 },
            CustodyError::InsufficientBalanceOrAllowance {
                account: [0u8; 32],
                available: 0,
                requested: 1,
            },
            CustodyError::PoolOperationFailed { operation: PoolOperation::Mint, code: 9 },
            CustodyError::EndpointMismatch { expected: [1u8; 32], actual: [2u8; 32] },
            CustodyError::InvalidAddress { reason: "zero" },
            CustodyError::InvalidWitness,
            CustodyError::InvalidStateTransition,
            CustodyError::Overflow,
            CustodyError::DivisionByZero,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_display_includes_code() {
        let err = CustodyError::IndexOutOfBounds { index: 5, len: 2 };
        assert_eq!(err.to_string(), "E020_INDEX_OUT_OF_BOUNDS: index 5 >= 2");

        let err = CustodyError::Unauthorized { caller: [9u8; 32], role: Role::Minter };
        assert_eq!(err.to_string(), "E001_UNAUTHORIZED: caller lacks MINTER_ROLE");
    }

    #[test]
    fn test_recoverable() {
        assert!(CustodyError::PoolOperationFailed { operation: PoolOperation::Redeem, code: 14 }
            .is_recoverable());
        assert!(!CustodyError::AlreadyInitialized.is_recoverable());
    }
}
