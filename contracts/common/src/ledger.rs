//! In-Memory Collaborators
//!
//! Reference implementations of [`CustodyAsset`] and [`YieldPool`] backed by
//! ordered maps. They are `Clone`, so a caller can stage a whole call against
//! copies and commit or discard the result.
//!
//! `MemoryPool` follows the lending market's accounting: supplying `amount`
//! credits `amount * 1e18 / rate` receipt tokens, redeeming burns tokens and
//! pays out `tokens * rate / 1e18` from the pool's cash.

use crate::constants::{memory_pool::INITIAL_EXCHANGE_RATE, pool_status};
use crate::errors::{CustodyError, CustodyResult};
use crate::interfaces::{CustodyAsset, YieldPool};
use crate::math::{pool_tokens_to_underlying, underlying_to_pool_tokens};
use crate::types::Address;
use crate::BTreeMap;
use tracing::trace;

// ============================================================================
// Custody Asset
// ============================================================================

/// Fungible token ledger with allowances.
///
/// An allowance of `u128::MAX` is treated as unlimited and never decreases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryAsset {
    address: Address,
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<(Address, Address), u128>,
    total_supply: u128,
}

impl MemoryAsset {
    /// Create an empty ledger deployed at `address`
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Create new units for `account` (faucet / test seeding)
    pub fn credit(&mut self, account: Address, amount: u128) -> CustodyResult<()> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(CustodyError::Overflow)?;
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(CustodyError::Overflow)?;
        Ok(())
    }

    /// Total units in existence
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn debit_checked(&self, from: &Address, amount: u128) -> CustodyResult<u128> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(CustodyError::InsufficientBalanceOrAllowance {
                account: *from,
                available,
                requested: amount,
            });
        }
        Ok(available - amount)
    }

    fn move_units(&mut self, from: &Address, to: &Address, amount: u128) -> CustodyResult<()> {
        let remaining = self.debit_checked(from, amount)?;
        let to_balance = self.balance_of(to);
        if from != to {
            let credited = to_balance.checked_add(amount).ok_or(CustodyError::Overflow)?;
            self.balances.insert(*from, remaining);
            self.balances.insert(*to, credited);
        }
        Ok(())
    }
}

impl CustodyAsset for MemoryAsset {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) -> CustodyResult<()> {
        self.allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> CustodyResult<()> {
        self.move_units(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> CustodyResult<()> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(CustodyError::InsufficientBalanceOrAllowance {
                account: *from,
                available: allowed,
                requested: amount,
            });
        }
        self.move_units(from, to, amount)?;
        if allowed != u128::MAX {
            self.allowances.insert((*from, *spender), allowed - amount);
        }
        Ok(())
    }
}

// ============================================================================
// Yield Pool
// ============================================================================

/// Lending market with a stored exchange rate and receipt-token balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPool {
    address: Address,
    underlying: Address,
    exchange_rate: u128,
    balances: BTreeMap<Address, u128>,
    total_supply: u128,
    forced_status: Option<u64>,
}

impl MemoryPool {
    /// Create a pool over `underlying` at the initial exchange rate
    pub fn new(address: Address, underlying: Address) -> Self {
        Self::with_exchange_rate(address, underlying, INITIAL_EXCHANGE_RATE)
    }

    /// Create a pool with a specific exchange rate mantissa
    pub fn with_exchange_rate(address: Address, underlying: Address, exchange_rate: u128) -> Self {
        Self {
            address,
            underlying,
            exchange_rate,
            balances: BTreeMap::new(),
            total_supply: 0,
            forced_status: None,
        }
    }

    /// Move the stored rate, e.g. to model accrued interest.
    ///
    /// The pool pays redemptions from its cash, so raising the rate only
    /// pays out if someone funds the difference.
    pub fn set_exchange_rate(&mut self, exchange_rate: u128) {
        self.exchange_rate = exchange_rate;
    }

    /// Make every entry point return `status` without side effects.
    /// `None` restores normal behavior.
    pub fn force_status(&mut self, status: Option<u64>) {
        self.forced_status = status;
    }

    /// Total receipt tokens outstanding
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Underlying held by the pool
    pub fn cash<A: CustodyAsset>(&self, asset: &A) -> u128 {
        asset.balance_of(&self.address)
    }

    fn precheck<A: CustodyAsset>(&self, asset: &A) -> Result<(), u64> {
        if let Some(status) = self.forced_status {
            return Err(status);
        }
        if asset.address() != self.underlying {
            return Err(pool_status::BAD_INPUT);
        }
        Ok(())
    }

    /// Burn `tokens` from `redeemer` and pay `underlying` out of cash
    fn redeem_fresh<A: CustodyAsset>(
        &mut self,
        asset: &mut A,
        redeemer: &Address,
        tokens: u128,
        underlying: u128,
    ) -> u64 {
        let held = self.balance_of(redeemer);
        if held < tokens {
            return pool_status::TOKEN_INSUFFICIENT_BALANCE;
        }
        if self.cash(asset) < underlying {
            return pool_status::TOKEN_INSUFFICIENT_CASH;
        }
        if asset.transfer(&self.address, redeemer, underlying).is_err() {
            return pool_status::TOKEN_TRANSFER_OUT_FAILED;
        }
        self.balances.insert(*redeemer, held - tokens);
        self.total_supply -= tokens;
        pool_status::NO_ERROR
    }
}

impl MemoryPool {
    fn supply<A: CustodyAsset>(&mut self, asset: &mut A, minter: &Address, amount: u128) -> u64 {
        if let Err(status) = self.precheck(asset) {
            return status;
        }
        let tokens = match underlying_to_pool_tokens(amount, self.exchange_rate) {
            Ok(t) => t,
            Err(_) => return pool_status::MATH_ERROR,
        };
        let new_balance = match self.balance_of(minter).checked_add(tokens) {
            Some(b) => b,
            None => return pool_status::MATH_ERROR,
        };
        let new_supply = match self.total_supply.checked_add(tokens) {
            Some(s) => s,
            None => return pool_status::MATH_ERROR,
        };
        if asset.allowance(minter, &self.address) < amount {
            return pool_status::TOKEN_INSUFFICIENT_ALLOWANCE;
        }
        let pool = self.address;
        if asset.transfer_from(&pool, minter, &pool, amount).is_err() {
            return pool_status::TOKEN_TRANSFER_IN_FAILED;
        }
        self.balances.insert(*minter, new_balance);
        self.total_supply = new_supply;
        pool_status::NO_ERROR
    }

    fn redeem_tokens<A: CustodyAsset>(
        &mut self,
        asset: &mut A,
        redeemer: &Address,
        tokens: u128,
    ) -> u64 {
        if let Err(status) = self.precheck(asset) {
            return status;
        }
        match pool_tokens_to_underlying(tokens, self.exchange_rate) {
            Ok(underlying) => self.redeem_fresh(asset, redeemer, tokens, underlying),
            Err(_) => pool_status::MATH_ERROR,
        }
    }

    fn withdraw_underlying<A: CustodyAsset>(
        &mut self,
        asset: &mut A,
        redeemer: &Address,
        amount: u128,
    ) -> u64 {
        if let Err(status) = self.precheck(asset) {
            return status;
        }
        match underlying_to_pool_tokens(amount, self.exchange_rate) {
            Ok(tokens) => self.redeem_fresh(asset, redeemer, tokens, amount),
            Err(_) => pool_status::MATH_ERROR,
        }
    }
}

impl YieldPool for MemoryPool {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn exchange_rate_stored(&self) -> u128 {
        self.exchange_rate
    }

    fn mint<A: CustodyAsset>(&mut self, asset: &mut A, minter: &Address, amount: u128) -> u64 {
        let status = self.supply(asset, minter, amount);
        reported("mint", status)
    }

    fn redeem<A: CustodyAsset>(&mut self, asset: &mut A, redeemer: &Address, tokens: u128) -> u64 {
        let status = self.redeem_tokens(asset, redeemer, tokens);
        reported("redeem", status)
    }

    fn redeem_underlying<A: CustodyAsset>(
        &mut self,
        asset: &mut A,
        redeemer: &Address,
        amount: u128,
    ) -> u64 {
        let status = self.withdraw_underlying(asset, redeemer, amount);
        reported("redeem_underlying", status)
    }
}

fn reported(entry_point: &'static str, status: u64) -> u64 {
    if status != pool_status::NO_ERROR {
        trace!(entry_point, status, "memory pool rejected call");
    }
    status
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::precision::EXP_SCALE;

    const USDT: Address = [0xA1; 32];
    const VUSDT: Address = [0xB2; 32];

    fn alice() -> Address {
        [1u8; 32]
    }

    fn bob() -> Address {
        [2u8; 32]
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let mut asset = MemoryAsset::new(USDT);
        asset.credit(alice(), 1_000).unwrap();
        asset.approve(&alice(), &bob(), 600).unwrap();

        asset.transfer_from(&bob(), &alice(), &bob(), 400).unwrap();

        assert_eq!(asset.balance_of(&alice()), 600);
        assert_eq!(asset.balance_of(&bob()), 400);
        assert_eq!(asset.allowance(&alice(), &bob()), 200);
    }

    #[test]
    fn test_transfer_from_without_allowance_fails_cleanly() {
        let mut asset = MemoryAsset::new(USDT);
        asset.credit(alice(), 1_000).unwrap();
        let before = asset.clone();

        let result = asset.transfer_from(&bob(), &alice(), &bob(), 1);
        assert_eq!(
            result,
            Err(CustodyError::InsufficientBalanceOrAllowance {
                account: alice(),
                available: 0,
                requested: 1,
            })
        );
        assert_eq!(asset, before);
    }

    #[test]
    fn test_transfer_from_insufficient_balance() {
        let mut asset = MemoryAsset::new(USDT);
        asset.credit(alice(), 50).unwrap();
        asset.approve(&alice(), &bob(), u128::MAX).unwrap();

        let result = asset.transfer_from(&bob(), &alice(), &bob(), 51);
        assert!(matches!(
            result,
            Err(CustodyError::InsufficientBalanceOrAllowance { available: 50, requested: 51, .. })
        ));
    }

    #[test]
    fn test_unlimited_allowance_not_decremented() {
        let mut asset = MemoryAsset::new(USDT);
        asset.credit(alice(), 100).unwrap();
        asset.approve(&alice(), &bob(), u128::MAX).unwrap();

        asset.transfer_from(&bob(), &alice(), &bob(), 100).unwrap();
        assert_eq!(asset.allowance(&alice(), &bob()), u128::MAX);
    }

    #[test]
    fn test_pool_mint_and_redeem() {
        let mut asset = MemoryAsset::new(USDT);
        let mut pool = MemoryPool::new(VUSDT, USDT);
        asset.credit(alice(), 100).unwrap();
        asset.approve(&alice(), &VUSDT, 100).unwrap();

        assert_eq!(pool.mint(&mut asset, &alice(), 100), pool_status::NO_ERROR);
        assert_eq!(pool.balance_of(&alice()), 100 * EXP_SCALE / INITIAL_EXCHANGE_RATE);
        assert_eq!(pool.cash(&asset), 100);
        assert_eq!(asset.balance_of(&alice()), 0);

        // 2_500 tokens at 0.02 = 50 underlying
        assert_eq!(pool.redeem(&mut asset, &alice(), 2_500), pool_status::NO_ERROR);
        assert_eq!(asset.balance_of(&alice()), 50);
        assert_eq!(pool.balance_of(&alice()), 2_500);

        assert_eq!(pool.redeem_underlying(&mut asset, &alice(), 50), pool_status::NO_ERROR);
        assert_eq!(asset.balance_of(&alice()), 100);
        assert_eq!(pool.balance_of(&alice()), 0);
        assert_eq!(pool.total_supply(), 0);
    }

    #[test]
    fn test_pool_mint_without_allowance() {
        let mut asset = MemoryAsset::new(USDT);
        let mut pool = MemoryPool::new(VUSDT, USDT);
        asset.credit(alice(), 100).unwrap();

        assert_eq!(
            pool.mint(&mut asset, &alice(), 100),
            pool_status::TOKEN_INSUFFICIENT_ALLOWANCE
        );
        assert_eq!(pool.balance_of(&alice()), 0);
        assert_eq!(asset.balance_of(&alice()), 100);
    }

    #[test]
    fn test_pool_redeem_more_than_held() {
        let mut asset = MemoryAsset::new(USDT);
        let mut pool = MemoryPool::new(VUSDT, USDT);

        assert_eq!(
            pool.redeem(&mut asset, &alice(), 1),
            pool_status::TOKEN_INSUFFICIENT_BALANCE
        );
    }

    #[test]
    fn test_pool_rejects_foreign_asset() {
        let mut other = MemoryAsset::new([0xCC; 32]);
        let mut pool = MemoryPool::new(VUSDT, USDT);

        assert_eq!(pool.mint(&mut other, &alice(), 0), pool_status::BAD_INPUT);
    }

    #[test]
    fn test_forced_status() {
        let mut asset = MemoryAsset::new(USDT);
        let mut pool = MemoryPool::new(VUSDT, USDT);
        asset.credit(alice(), 100).unwrap();
        asset.approve(&alice(), &VUSDT, 100).unwrap();

        pool.force_status(Some(pool_status::MATH_ERROR));
        assert_eq!(pool.mint(&mut asset, &alice(), 100), pool_status::MATH_ERROR);
        assert_eq!(asset.balance_of(&alice()), 100);

        pool.force_status(None);
        assert_eq!(pool.mint(&mut asset, &alice(), 100), pool_status::NO_ERROR);
    }

    #[test]
    fn test_rate_increase_needs_cash() {
        let mut asset = MemoryAsset::new(USDT);
        let mut pool = MemoryPool::new(VUSDT, USDT);
        asset.credit(alice(), 100).unwrap();
        asset.approve(&alice(), &VUSDT, 100).unwrap();
        pool.mint(&mut asset, &alice(), 100);

        // Double the rate: 5_000 tokens now worth 200 underlying
        pool.set_exchange_rate(2 * INITIAL_EXCHANGE_RATE);
        assert_eq!(
            pool.redeem(&mut asset, &alice(), 5_000),
            pool_status::TOKEN_INSUFFICIENT_CASH
        );

        asset.credit(VUSDT, 100).unwrap();
        assert_eq!(pool.redeem(&mut asset, &alice(), 5_000), pool_status::NO_ERROR);
        assert_eq!(asset.balance_of(&alice()), 200);
    }
}
