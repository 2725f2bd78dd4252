//! Yield Custody Common Library
//!
//! Shared types, constants, and utilities for the yield custody vault.
//!
//! The vault holds a stablecoin (the *custody asset*) on behalf of a
//! role-permissioned set of accounts and deposits it into an external
//! lending protocol (the *yield pool*), which issues an interest-accruing
//! receipt token in exchange.
//!
//! ## Modules
//!
//! - **Access Control**: `Admin` / `Minter` / `Operator` role table
//! - **Interfaces**: narrow traits for the custody asset and the yield pool
//! - **Ledger**: in-memory implementations of both collaborators
//! - **Math**: exchange-rate conversions between underlying and pool tokens
//! - **Events**: indexable event log emitted by every mutating operation
//! - **Errors**: typed errors with stable error codes
//!
//! This crate is `no_std` compatible for WASM compilation when built
//! without the default `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::BTreeMap, vec::Vec};

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod access_control;
pub mod interfaces;
pub mod ledger;


// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use access_control::*;
pub use interfaces::*;
pub use ledger::*;
