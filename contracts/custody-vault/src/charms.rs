//! Charms SDK Integration for the Custody Vault
//!
//! This module provides the bridge between the Charms SDK types and
//! the internal vault transition rules.
//!
//! The vault's storage travels as the app's charm data: the spent state is
//! found in the transaction inputs (or refs), the new state in the outputs.
//! The witness carries the call; see [`crate::witness`].

use charms_data::{App, Data, Transaction};
use tracing::warn;

use crate::witness::CustodyWitness;
use crate::{resolve_input, validate_transition, VaultState};
use custody_common::{
    errors::{CustodyError, CustodyResult},
    events::EventLog,
};

/// Validates a custody vault operation within a Charms transaction.
///
/// - **Initialize**: with no vault among the spent charms, the output must
///   be a fresh vault at the app's identity with the initializer's setup
///   applied. A spent vault is initialized against and therefore rejected
/// - **Storage operations**: the output must be the input with the call applied
/// - **Custody operations**: the caller must be authorized and the vault
///   storage must pass through unchanged
///
/// # Arguments
/// * `app` - The custody vault app definition
/// * `tx` - The transaction being validated
/// * `x` - Public input data (unused)
/// * `w` - Witness data containing the call
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn validate_custody_operation(app: &App, tx: &Transaction, _x: &Data, w: &Data) -> bool {
    match check_operation(app, tx, w) {
        Ok(_) => true,
        Err(err) => {
            warn!(code = err.code(), %err, "transition rejected");
            false
        }
    }
}

fn check_operation(app: &App, tx: &Transaction, w: &Data) -> CustodyResult<EventLog> {
    let call = parse_witness(w)?.to_call()?;

    let input = resolve_input(&call.action, extract_input_state(app, tx), app.identity.0)?;
    let output = extract_output_state(app, tx).ok_or(CustodyError::InvalidStateTransition)?;

    validate_transition(&input, &output, &call)
}

fn parse_witness(w: &Data) -> CustodyResult<CustodyWitness> {
    w.value::<CustodyWitness>().map_err(|_| CustodyError::InvalidWitness)
}

/// Find the spent vault state in refs or inputs
fn extract_input_state(app: &App, tx: &Transaction) -> Option<VaultState> {
    tx.refs
        .iter()
        .chain(tx.ins.iter())
        .find_map(|(_, charms)| charms.get(app).and_then(deserialize_vault_state))
}

/// Find the new vault state in outputs
fn extract_output_state(app: &App, tx: &Transaction) -> Option<VaultState> {
    tx.outs
        .iter()
        .find_map(|charms| charms.get(app).and_then(deserialize_vault_state))
}

fn deserialize_vault_state(data: &Data) -> Option<VaultState> {
    data.value::<VaultState>().ok()
}
