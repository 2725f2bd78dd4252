//! Witness Encoding
//!
//! Flat, serde-friendly form of a [`CustodyCall`], carried as the witness
//! of a Charms transaction. Fields not used by an operation stay `None`.
//!
//! ## Operations
//!
//! | Op   | Action             | Fields                      |
//! |------|--------------------|-----------------------------|
//! | 0x00 | Initialize         | `account`, `pool`           |
//! | 0x01 | GrantRole          | `role`, `account`           |
//! | 0x02 | RevokeRole         | `role`, `account`           |
//! | 0x03 | RenounceRole       | `role`                      |
//! | 0x10 | Mint               | `id`, `amount`              |
//! | 0x11 | MintForHolder      | `account`, `amount`         |
//! | 0x12 | MintFrom           | `id`, `amount`, `account`   |
//! | 0x13 | Redeem             | `amount`                    |
//! | 0x14 | RedeemUnderlying   | `amount`                    |
//! | 0x20 | SetHolders         | `holders`                   |
//! | 0x21 | SetTokenId         | `id`                        |
//! | 0x22 | BatchAddHolder     | `id`                        |
//! | 0x30 | AuthorizeUpgrade   | `account`                   |
//! | 0x31 | UpgradeTo          | `account`                   |

use serde::{Deserialize, Serialize};

use custody_common::{
    errors::{CustodyError, CustodyResult},
    types::{Address, CustodyAction, CustodyCall, Role},
};

/// Operation codes encoded in witness data
pub mod op {
    pub const INITIALIZE: u8 = 0x00;
    pub const GRANT_ROLE: u8 = 0x01;
    pub const REVOKE_ROLE: u8 = 0x02;
    pub const RENOUNCE_ROLE: u8 = 0x03;

    pub const MINT: u8 = 0x10;
    pub const MINT_FOR_HOLDER: u8 = 0x11;
    pub const MINT_FROM: u8 = 0x12;
    pub const REDEEM: u8 = 0x13;
    pub const REDEEM_UNDERLYING: u8 = 0x14;

    pub const SET_HOLDERS: u8 = 0x20;
    pub const SET_TOKEN_ID: u8 = 0x21;
    pub const BATCH_ADD_HOLDER: u8 = 0x22;

    pub const AUTHORIZE_UPGRADE: u8 = 0x30;
    pub const UPGRADE_TO: u8 = 0x31;
}

/// Witness structure for vault operations (serialized via serde)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyWitness {
    pub op: u8,
    /// Claimed caller. The witness is not signed: the vault checks this
    /// account's roles but cannot prove the spell was built by it. Hosts
    /// must bind it to an authenticated signer before trusting a transition.
    pub caller: Address,
    pub block_height: u64,
    /// Role tag, see [`Role::tag`]
    pub role: Option<u8>,
    pub amount: Option<u128>,
    /// Pool id, token id or batch size depending on `op`
    pub id: Option<u64>,
    /// Account, holder, source or implementation depending on `op`
    pub account: Option<Address>,
    /// Yield pool endpoint (initialize only)
    pub pool: Option<Address>,
    pub holders: Option<Vec<Address>>,
}

impl CustodyWitness {
    fn empty(op: u8, caller: Address, block_height: u64) -> Self {
        Self {
            op,
            caller,
            block_height,
            role: None,
            amount: None,
            id: None,
            account: None,
            pool: None,
            holders: None,
        }
    }

    /// Encode a call as a witness
    pub fn from_call(call: &CustodyCall) -> Self {
        let mut w = Self::empty(0, call.caller, call.block_height);
        match &call.action {
            CustodyAction::Initialize { custody_asset, yield_pool } => {
                w.op = op::INITIALIZE;
                w.account = Some(*custody_asset);
                w.pool = Some(*yield_pool);
            }
            CustodyAction::GrantRole { role, account } => {
                w.op = op::GRANT_ROLE;
                w.role = Some(role.tag());
                w.account = Some(*account);
            }
            CustodyAction::RevokeRole { role, account } => {
                w.op = op::REVOKE_ROLE;
                w.role = Some(role.tag());
                w.account = Some(*account);
            }
            CustodyAction::RenounceRole { role } => {
                w.op = op::RENOUNCE_ROLE;
                w.role = Some(role.tag());
            }
            CustodyAction::Mint { pool_id, amount } => {
                w.op = op::MINT;
                w.id = Some(*pool_id);
                w.amount = Some(*amount);
            }
            CustodyAction::MintForHolder { holder, amount } => {
                w.op = op::MINT_FOR_HOLDER;
                w.account = Some(*holder);
                w.amount = Some(*amount);
            }
            CustodyAction::MintFrom { pool_id, amount, from } => {
                w.op = op::MINT_FROM;
                w.id = Some(*pool_id);
                w.amount = Some(*amount);
                w.account = Some(*from);
            }
            CustodyAction::Redeem { amount } => {
                w.op = op::REDEEM;
                w.amount = Some(*amount);
            }
            CustodyAction::RedeemUnderlying { amount } => {
                w.op = op::REDEEM_UNDERLYING;
                w.amount = Some(*amount);
            }
            CustodyAction::SetHolders { holders } => {
                w.op = op::SET_HOLDERS;
                w.holders = Some(holders.clone());
            }
            CustodyAction::SetTokenId { token_id } => {
                w.op = op::SET_TOKEN_ID;
                w.id = Some(*token_id);
            }
            CustodyAction::BatchAddHolder { size } => {
                w.op = op::BATCH_ADD_HOLDER;
                w.id = Some(*size);
            }
            CustodyAction::AuthorizeUpgrade { new_implementation } => {
                w.op = op::AUTHORIZE_UPGRADE;
                w.account = Some(*new_implementation);
            }
            CustodyAction::UpgradeTo { new_implementation } => {
                w.op = op::UPGRADE_TO;
                w.account = Some(*new_implementation);
            }
        }
        w
    }

    /// Decode into a call; `InvalidWitness` on an unknown op, a missing
    /// field or an unknown role tag
    pub fn to_call(&self) -> CustodyResult<CustodyCall> {
        let role = || self.role.and_then(Role::from_tag);

        let action = match self.op {
            op::INITIALIZE => CustodyAction::Initialize {
                custody_asset: field(self.account)?,
                yield_pool: field(self.pool)?,
            },
            op::GRANT_ROLE => CustodyAction::GrantRole {
                role: field(role())?,
                account: field(self.account)?,
            },
            op::REVOKE_ROLE => CustodyAction::RevokeRole {
                role: field(role())?,
                account: field(self.account)?,
            },
            op::RENOUNCE_ROLE => CustodyAction::RenounceRole { role: field(role())? },
            op::MINT => CustodyAction::Mint {
                pool_id: field(self.id)?,
                amount: field(self.amount)?,
            },
            op::MINT_FOR_HOLDER => CustodyAction::MintForHolder {
                holder: field(self.account)?,
                amount: field(self.amount)?,
            },
            op::MINT_FROM => CustodyAction::MintFrom {
                pool_id: field(self.id)?,
                amount: field(self.amount)?,
                from: field(self.account)?,
            },
            op::REDEEM => CustodyAction::Redeem { amount: field(self.amount)? },
            op::REDEEM_UNDERLYING => CustodyAction::RedeemUnderlying {
                amount: field(self.amount)?,
            },
            op::SET_HOLDERS => CustodyAction::SetHolders {
                holders: field(self.holders.clone())?,
            },
            op::SET_TOKEN_ID => CustodyAction::SetTokenId { token_id: field(self.id)? },
            op::BATCH_ADD_HOLDER => CustodyAction::BatchAddHolder { size: field(self.id)? },
            op::AUTHORIZE_UPGRADE => CustodyAction::AuthorizeUpgrade {
                new_implementation: field(self.account)?,
            },
            op::UPGRADE_TO => CustodyAction::UpgradeTo {
                new_implementation: field(self.account)?,
            },
            _ => return Err(CustodyError::InvalidWitness),
        };

        Ok(CustodyCall::new(self.caller, self.block_height, action))
    }
}

fn field<T>(value: Option<T>) -> CustodyResult<T> {
    value.ok_or(CustodyError::InvalidWitness)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Address = [1u8; 32];

    fn cbor_roundtrip(w: &CustodyWitness) -> CustodyWitness {
        let mut buf = Vec::new();
        ciborium::into_writer(w, &mut buf).unwrap();
        ciborium::from_reader(buf.as_slice()).unwrap()
    }

    #[test]
    fn test_mint_from_witness_decodes() {
        let call = CustodyCall::new(
            ADMIN,
            42,
            CustodyAction::MintFrom { pool_id: 3, amount: 1_000, from: [7u8; 32] },
        );

        let witness = CustodyWitness::from_call(&call);
        assert_eq!(witness.op, op::MINT_FROM);

        let decoded = cbor_roundtrip(&witness).to_call().unwrap();
        assert_eq!(decoded, call);
    }

    #[test]
    fn test_set_holders_witness_keeps_order_and_duplicates() {
        let holders = vec![[5u8; 32], [6u8; 32], [5u8; 32]];
        let action = CustodyAction::SetHolders { holders: holders.clone() };
        let call = CustodyCall::new(ADMIN, 9, action);

        let decoded = cbor_roundtrip(&CustodyWitness::from_call(&call)).to_call().unwrap();
        assert_eq!(decoded.action, CustodyAction::SetHolders { holders });
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut witness = CustodyWitness::from_call(&CustodyCall::new(
            ADMIN,
            1,
            CustodyAction::Redeem { amount: 10 },
        ));
        witness.amount = None;
        assert_eq!(witness.to_call(), Err(CustodyError::InvalidWitness));
    }

    #[test]
    fn test_unknown_op_rejected() {
        let mut witness = CustodyWitness::from_call(&CustodyCall::new(
            ADMIN,
            1,
            CustodyAction::SetTokenId { token_id: 4 },
        ));
        witness.op = 0xFF;
        assert_eq!(witness.to_call(), Err(CustodyError::InvalidWitness));
    }

    #[test]
    fn test_unknown_role_tag_rejected() {
        let mut witness = CustodyWitness::from_call(&CustodyCall::new(
            ADMIN,
            1,
            CustodyAction::RenounceRole { role: Role::Operator },
        ));
        assert_eq!(witness.role, Some(2));
        witness.role = Some(9);
        assert_eq!(witness.to_call(), Err(CustodyError::InvalidWitness));
    }
}
