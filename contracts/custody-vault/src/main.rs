//! Custody Vault - Charms App Entry Point
//!
//! This binary is the entry point for the custody vault when running
//! as a Charms application.

use charms_sdk::data::{App, Data, Transaction};

/// Main validation function for custody vault operations.
///
/// # Arguments
/// * `app` - The custody vault app definition
/// * `tx` - The transaction being validated
/// * `x` - Public input data (unused)
/// * `w` - Witness data (contains the encoded call)
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn app_contract(app: &App, tx: &Transaction, x: &Data, w: &Data) -> bool {
    custody_vault::charms::validate_custody_operation(app, tx, x, w)
}

charms_sdk::main!(app_contract);
