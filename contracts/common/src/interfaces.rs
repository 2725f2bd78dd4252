//! Collaborator Interfaces
//!
//! The vault never owns the stablecoin or the lending market; it talks to
//! them through these two traits. Implementations are injected: the
//! in-memory [`crate::ledger`] types for tests and simulation, a host
//! binding in production.
//!
//! There is no ambient message sender, so every mutating method names the
//! acting account explicitly.

use crate::errors::CustodyResult;
use crate::types::Address;

/// Fungible custody asset (the stablecoin)
pub trait CustodyAsset {
    /// Contract address of this asset
    fn address(&self) -> Address;

    /// Balance held by `account`
    fn balance_of(&self, account: &Address) -> u128;

    /// Amount `spender` may still pull from `owner`
    fn allowance(&self, owner: &Address, spender: &Address) -> u128;

    /// `owner` allows `spender` to pull up to `amount` (overwrites)
    fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) -> CustodyResult<()>;

    /// Move `amount` from `from` to `to`, acting as `from`
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> CustodyResult<()>;

    /// `spender` moves `amount` from `from` to `to` against its allowance.
    ///
    /// Fails with `InsufficientBalanceOrAllowance` without side effects.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> CustodyResult<()>;
}

/// Interest-bearing lending market over a custody asset
///
/// Entry points report failure through a status code, `0` meaning success,
/// and leave no side effects when they fail.
pub trait YieldPool {
    /// Contract address of this pool (and of its receipt token)
    fn address(&self) -> Address;

    /// Receipt-token balance of `account`
    fn balance_of(&self, account: &Address) -> u128;

    /// Stored exchange rate mantissa (underlying per token, scaled by 1e18)
    fn exchange_rate_stored(&self) -> u128;

    /// Supply `amount` of underlying from `minter`, crediting receipt tokens
    fn mint<A: CustodyAsset>(&mut self, asset: &mut A, minter: &Address, amount: u128) -> u64;

    /// Burn `tokens` receipt tokens of `redeemer` for underlying
    fn redeem<A: CustodyAsset>(&mut self, asset: &mut A, redeemer: &Address, tokens: u128) -> u64;

    /// Withdraw exactly `amount` of underlying for `redeemer`
    fn redeem_underlying<A: CustodyAsset>(
        &mut self,
        asset: &mut A,
        redeemer: &Address,
        amount: u128,
    ) -> u64;
}
