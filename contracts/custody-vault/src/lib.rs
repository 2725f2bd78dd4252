//! Yield Custody Vault Contract
//!
//! Role-gated wrapper that pulls a stablecoin into custody, supplies it to
//! an external lending pool, and redeems it later. Also keeps an
//! admin-managed holder registry and a single token identifier used for
//! event tagging.
//!
//! ## Call Model
//!
//! Every public operation is one transaction: [`CustodyVault::execute`]
//! stages the call against copies of the vault state and both
//! collaborators and commits only if the whole sequence succeeds. A failed
//! call leaves no trace, events included.
//!
//! ## Charms Integration
//!
//! When compiled with the `charms` feature, this crate provides a Charms
//! app entry point via the `charms` module.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "charms")]
pub mod charms;
pub mod witness;


use custody_common::{
    access_control::{self, AccessControlState},
    constants::{interface_signatures, pool_status},
    errors::{CustodyError, CustodyResult},
    events::{CustodyEvent, EventLog},
    interfaces::{CustodyAsset, YieldPool},
    math::pool_tokens_to_underlying,
    types::{
        Address, AssetEndpoints, CustodyAction, CustodyCall, InterfaceId, PoolOperation, Role,
        ZERO_ADDRESS,
    },
};

// ============ Vault State ============

/// Persistent storage of one vault instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct VaultState {
    /// The vault's own account; custody balances are held here
    pub address: Address,
    /// One-shot initialization latch
    pub initialized: bool,
    /// Custody asset and yield pool, zero until initialized
    pub endpoints: AssetEndpoints,
    /// Role table
    pub access: AccessControlState,
    /// Holder registry (ordered, duplicates allowed)
    pub holders: Vec<Address>,
    /// Opaque identifier used for event tagging
    pub token_id: u64,
    /// Current upgrade target, zero until the first upgrade
    pub implementation: Address,
    /// Set while a custody operation is calling out
    pub entered: bool,
}

impl VaultState {
    /// Fresh, uninitialized storage for a vault deployed at `address`
    pub fn new(address: Address) -> Self {
        Self {
            address,
            initialized: false,
            endpoints: AssetEndpoints::default(),
            access: AccessControlState::new(),
            holders: Vec::new(),
            token_id: 0,
            implementation: ZERO_ADDRESS,
            entered: false,
        }
    }

    /// Configured endpoints, once initialized
    pub fn endpoints(&self) -> Option<&AssetEndpoints> {
        self.initialized.then_some(&self.endpoints)
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        access_control::has_role(&self.access, account, role)
    }

    pub fn holders(&self) -> &[Address] {
        &self.holders
    }

    /// Holder at `index`; fails with `IndexOutOfBounds` past the end
    pub fn holder(&self, index: u64) -> CustodyResult<Address> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.holders.get(i).copied())
            .ok_or(CustodyError::IndexOutOfBounds {
                index,
                len: self.holders_count(),
            })
    }

    pub fn holders_count(&self) -> u64 {
        self.holders.len() as u64
    }

    pub fn token_id(&self) -> u64 {
        self.token_id
    }

    pub fn implementation(&self) -> Address {
        self.implementation
    }
}

/// Capability introspection: access control, introspection itself, and
/// the custody vault surface
pub fn supports_interface(interface_id: &InterfaceId) -> bool {
    access_control::supports_access_control_interface(interface_id)
        || *interface_id == access_control::interface_id(interface_signatures::CUSTODY_VAULT)
}

// ============ Call Context ============

/// Per-call execution context
pub struct CallContext {
    /// Message sender
    pub caller: Address,
    /// Current block height
    pub block_height: u64,
    /// Event log for emitting events
    pub events: EventLog,
}

impl CallContext {
    pub fn new(caller: Address, block_height: u64) -> Self {
        Self {
            caller,
            block_height,
            events: EventLog::new(),
        }
    }
}

// ============ Deployed Vault ============

/// A vault instance wired to its collaborators.
///
/// The asset and pool are injected; `asset_mut` / `pool_mut` give other
/// accounts a way to act on them directly (approvals, funding) between
/// vault calls.
#[derive(Debug, Clone)]
pub struct CustodyVault<A, P> {
    state: VaultState,
    asset: A,
    pool: P,
}

impl<A, P> CustodyVault<A, P>
where
    A: CustodyAsset + Clone,
    P: YieldPool + Clone,
{
    /// Deploy an uninitialized vault at `address`
    pub fn deploy(address: Address, asset: A, pool: P) -> Self {
        Self {
            state: VaultState::new(address),
            asset,
            pool,
        }
    }

    /// Execute one call atomically; returns the events it emitted
    pub fn execute(&mut self, call: &CustodyCall) -> CustodyResult<Vec<CustodyEvent>> {
        let mut state = self.state.clone();
        let mut asset = self.asset.clone();
        let mut pool = self.pool.clone();
        let mut ctx = CallContext::new(call.caller, call.block_height);

        match apply(&mut state, &mut asset, &mut pool, &mut ctx, &call.action) {
            Ok(()) => {
                self.state = state;
                self.asset = asset;
                self.pool = pool;
                debug!(
                    operation = call.action.name(),
                    block_height = call.block_height,
                    events = ctx.events.len(),
                    "call committed"
                );
                Ok(ctx.events.into_events())
            }
            Err(err) => {
                warn!(
                    operation = call.action.name(),
                    block_height = call.block_height,
                    code = err.code(),
                    "call reverted"
                );
                Err(err)
            }
        }
    }

    pub fn state(&self) -> &VaultState {
        &self.state
    }

    pub fn address(&self) -> Address {
        self.state.address
    }

    pub fn asset(&self) -> &A {
        &self.asset
    }

    pub fn asset_mut(&mut self) -> &mut A {
        &mut self.asset
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut P {
        &mut self.pool
    }

    // ============ Queries ============

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.state.has_role(role, account)
    }

    pub fn role_admin(&self, role: Role) -> Role {
        access_control::role_admin(role)
    }

    pub fn supports_interface(&self, interface_id: &InterfaceId) -> bool {
        supports_interface(interface_id)
    }

    pub fn holders(&self) -> &[Address] {
        self.state.holders()
    }

    pub fn holder(&self, index: u64) -> CustodyResult<Address> {
        self.state.holder(index)
    }

    pub fn holders_count(&self) -> u64 {
        self.state.holders_count()
    }

    pub fn token_id(&self) -> u64 {
        self.state.token_id()
    }

    /// Custody asset held by the vault (not yet supplied)
    pub fn custody_balance(&self) -> u128 {
        self.asset.balance_of(&self.state.address)
    }

    /// Pool tokens held by the vault
    pub fn pool_token_balance(&self) -> u128 {
        self.pool.balance_of(&self.state.address)
    }

    /// Pool's stored exchange rate mantissa
    pub fn exchange_rate(&self) -> u128 {
        self.pool.exchange_rate_stored()
    }

    /// Pool tokens held by the vault, valued in underlying at the stored rate
    pub fn underlying_value(&self) -> CustodyResult<u128> {
        pool_tokens_to_underlying(self.pool_token_balance(), self.exchange_rate())
    }
}

// ============ Dispatch ============

/// Apply one action against staged state and collaborators
pub fn apply<A: CustodyAsset, P: YieldPool>(
    state: &mut VaultState,
    asset: &mut A,
    pool: &mut P,
    ctx: &mut CallContext,
    action: &CustodyAction,
) -> CustodyResult<()> {
    match action {
        CustodyAction::Initialize { custody_asset, yield_pool } => {
            initialize(state, ctx, *custody_asset, *yield_pool)?;
            // Injected collaborators must be the ones just configured
            ensure_endpoints(state, asset, pool)
        }
        CustodyAction::Mint { pool_id, amount } => mint(state, asset, pool, ctx, *pool_id, *amount),
        CustodyAction::MintForHolder { holder, amount } => {
            mint_for_holder(state, asset, pool, ctx, *holder, *amount)
        }
        CustodyAction::MintFrom { pool_id, amount, from } => {
            mint_from(state, asset, pool, ctx, *pool_id, *amount, *from)
        }
        CustodyAction::Redeem { amount } => redeem(state, asset, pool, ctx, *amount),
        CustodyAction::RedeemUnderlying { amount } => {
            redeem_underlying(state, asset, pool, ctx, *amount)
        }
        CustodyAction::GrantRole { role, account } => grant_role(state, ctx, *role, *account),
        CustodyAction::RevokeRole { role, account } => revoke_role(state, ctx, *role, *account),
        CustodyAction::RenounceRole { role } => renounce_role(state, ctx, *role),
        CustodyAction::SetHolders { holders } => set_holders(state, ctx, holders.clone()),
        CustodyAction::SetTokenId { token_id } => set_token_id(state, ctx, *token_id),
        CustodyAction::BatchAddHolder { size } => batch_add_holder(state, ctx, *size),
        CustodyAction::AuthorizeUpgrade { new_implementation } => {
            authorize_upgrade(state, ctx, new_implementation)
        }
        CustodyAction::UpgradeTo { new_implementation } => {
            upgrade_to(state, ctx, *new_implementation)
        }
    }
}

/// Apply an action that touches only the vault's own storage.
///
/// Returns `None` for custody actions, which need collaborators.
pub fn apply_storage_action(
    state: &mut VaultState,
    ctx: &mut CallContext,
    action: &CustodyAction,
) -> Option<CustodyResult<()>> {
    let result = match action {
        CustodyAction::Initialize { custody_asset, yield_pool } => {
            initialize(state, ctx, *custody_asset, *yield_pool)
        }
        CustodyAction::GrantRole { role, account } => grant_role(state, ctx, *role, *account),
        CustodyAction::RevokeRole { role, account } => revoke_role(state, ctx, *role, *account),
        CustodyAction::RenounceRole { role } => renounce_role(state, ctx, *role),
        CustodyAction::SetHolders { holders } => set_holders(state, ctx, holders.clone()),
        CustodyAction::SetTokenId { token_id } => set_token_id(state, ctx, *token_id),
        CustodyAction::BatchAddHolder { size } => batch_add_holder(state, ctx, *size),
        CustodyAction::AuthorizeUpgrade { new_implementation } => {
            authorize_upgrade(state, ctx, new_implementation)
        }
        CustodyAction::UpgradeTo { new_implementation } => {
            upgrade_to(state, ctx, *new_implementation)
        }
        CustodyAction::Mint { .. }
        | CustodyAction::MintForHolder { .. }
        | CustodyAction::MintFrom { .. }
        | CustodyAction::Redeem { .. }
        | CustodyAction::RedeemUnderlying { .. } => return None,
    };
    Some(result)
}

/// Authorization gate for `call` without executing it: initialization
/// state, required role, and the reentrancy latch for custody actions.
pub fn pre_authorize(state: &VaultState, call: &CustodyCall) -> CustodyResult<()> {
    match call.action.required_role() {
        Some(role) => authorize(state, &call.caller, role)?,
        None => {
            if let CustodyAction::Initialize { .. } = call.action {
                if state.initialized {
                    return Err(CustodyError::AlreadyInitialized);
                }
            } else {
                ensure_initialized(state)?;
            }
        }
    }
    if call.action.touches_collaborators() && state.entered {
        return Err(CustodyError::ReentrantCall);
    }
    Ok(())
}

/// Pick the vault state a host transaction spends.
///
/// `spent` is the vault state found among the transaction's inputs. Only
/// `initialize` may start from nothing, and then from a fresh vault at
/// `address`; once a vault exists, `initialize` runs against it and fails.
pub fn resolve_input(
    action: &CustodyAction,
    spent: Option<VaultState>,
    address: Address,
) -> CustodyResult<VaultState> {
    match (spent, action) {
        (Some(state), _) => Ok(state),
        (None, CustodyAction::Initialize { .. }) => Ok(VaultState::new(address)),
        (None, _) => Err(CustodyError::NotInitialized),
    }
}

/// Check that `output` is exactly `input` after `call`.
///
/// Custody actions move balances in the collaborators only, so for them
/// the vault storage must come out unchanged once the caller is authorized.
pub fn validate_transition(
    input: &VaultState,
    output: &VaultState,
    call: &CustodyCall,
) -> CustodyResult<EventLog> {
    let mut ctx = CallContext::new(call.caller, call.block_height);
    let mut expected = input.clone();

    match apply_storage_action(&mut expected, &mut ctx, &call.action) {
        Some(result) => result?,
        None => pre_authorize(input, call)?,
    }

    if expected != *output {
        return Err(CustodyError::InvalidStateTransition);
    }
    Ok(ctx.events)
}

// ============ Guards ============

fn ensure_initialized(state: &VaultState) -> CustodyResult<()> {
    if state.initialized {
        Ok(())
    } else {
        Err(CustodyError::NotInitialized)
    }
}

fn authorize(state: &VaultState, caller: &Address, role: Role) -> CustodyResult<()> {
    ensure_initialized(state)?;
    access_control::require_role(&state.access, caller, role)
}

fn ensure_endpoints<A: CustodyAsset, P: YieldPool>(
    state: &VaultState,
    asset: &A,
    pool: &P,
) -> CustodyResult<()> {
    let expected = state.endpoints;
    if asset.address() != expected.custody_asset {
        return Err(CustodyError::EndpointMismatch {
            expected: expected.custody_asset,
            actual: asset.address(),
        });
    }
    if pool.address() != expected.yield_pool {
        return Err(CustodyError::EndpointMismatch {
            expected: expected.yield_pool,
            actual: pool.address(),
        });
    }
    Ok(())
}

/// Run `f` with the reentrancy latch held; `f` receives the vault address
fn guarded<T>(
    state: &mut VaultState,
    f: impl FnOnce(&Address) -> CustodyResult<T>,
) -> CustodyResult<T> {
    if state.entered {
        return Err(CustodyError::ReentrantCall);
    }
    state.entered = true;
    let vault = state.address;
    let result = f(&vault);
    state.entered = false;
    result
}

fn check_status(operation: PoolOperation, code: u64) -> CustodyResult<()> {
    if code == pool_status::NO_ERROR {
        Ok(())
    } else {
        Err(CustodyError::PoolOperationFailed { operation, code })
    }
}

// ============ Access Control ============

/// One-time setup: store endpoints and grant every role to the caller
pub fn initialize(
    state: &mut VaultState,
    ctx: &mut CallContext,
    custody_asset: Address,
    yield_pool: Address,
) -> CustodyResult<()> {
    // 1. One shot only, whatever the arguments
    if state.initialized {
        return Err(CustodyError::AlreadyInitialized);
    }

    // 2. Endpoints must be real contracts
    if custody_asset == ZERO_ADDRESS {
        return Err(CustodyError::InvalidAddress { reason: "custody asset is zero" });
    }
    if yield_pool == ZERO_ADDRESS {
        return Err(CustodyError::InvalidAddress { reason: "yield pool is zero" });
    }

    // 3. Latch and store
    state.initialized = true;
    state.endpoints = AssetEndpoints::new(custody_asset, yield_pool);

    ctx.events.emit(CustodyEvent::Initialized {
        admin: ctx.caller,
        custody_asset,
        yield_pool,
        block_height: ctx.block_height,
    });

    // 4. Initializer holds every role
    for role in Role::ALL {
        let granted = access_control::insert_role(
            &mut state.access,
            ctx.caller,
            ctx.caller,
            role,
            ctx.block_height,
        );
        if granted {
            ctx.events.emit(CustodyEvent::RoleGranted {
                role,
                account: ctx.caller,
                sender: ctx.caller,
                block_height: ctx.block_height,
            });
        }
    }

    Ok(())
}

pub fn grant_role(
    state: &mut VaultState,
    ctx: &mut CallContext,
    role: Role,
    account: Address,
) -> CustodyResult<()> {
    ensure_initialized(state)?;
    let granted =
        access_control::grant_role(&mut state.access, ctx.caller, account, role, ctx.block_height)?;
    if granted {
        ctx.events.emit(CustodyEvent::RoleGranted {
            role,
            account,
            sender: ctx.caller,
            block_height: ctx.block_height,
        });
    }
    Ok(())
}

pub fn revoke_role(
    state: &mut VaultState,
    ctx: &mut CallContext,
    role: Role,
    account: Address,
) -> CustodyResult<()> {
    ensure_initialized(state)?;
    let revoked = access_control::revoke_role(
        &mut state.access,
        ctx.caller,
        account,
        role,
        ctx.block_height,
    )?;
    if revoked {
        ctx.events.emit(CustodyEvent::RoleRevoked {
            role,
            account,
            sender: ctx.caller,
            block_height: ctx.block_height,
        });
    }
    Ok(())
}

pub fn renounce_role(
    state: &mut VaultState,
    ctx: &mut CallContext,
    role: Role,
) -> CustodyResult<()> {
    ensure_initialized(state)?;
    if access_control::renounce_role(&mut state.access, ctx.caller, role, ctx.block_height) {
        ctx.events.emit(CustodyEvent::RoleRevoked {
            role,
            account: ctx.caller,
            sender: ctx.caller,
            block_height: ctx.block_height,
        });
    }
    Ok(())
}

// ============ Custody & Exchange ============

/// Pull `amount` from `source` into custody, approve the pool, supply it
fn deposit<A: CustodyAsset, P: YieldPool>(
    state: &mut VaultState,
    asset: &mut A,
    pool: &mut P,
    source: &Address,
    amount: u128,
) -> CustodyResult<()> {
    ensure_endpoints(state, asset, pool)?;
    guarded(state, |vault| {
        asset.transfer_from(vault, source, vault, amount)?;
        asset.approve(vault, &pool.address(), amount)?;
        check_status(PoolOperation::Mint, pool.mint(asset, vault, amount))
    })
}

/// Supply caller's funds, tagged with `pool_id`
pub fn mint<A: CustodyAsset, P: YieldPool>(
    state: &mut VaultState,
    asset: &mut A,
    pool: &mut P,
    ctx: &mut CallContext,
    pool_id: u64,
    amount: u128,
) -> CustodyResult<()> {
    authorize(state, &ctx.caller, Role::Minter)?;
    let caller = ctx.caller;
    deposit(state, asset, pool, &caller, amount)?;

    ctx.events.emit(CustodyEvent::Minted {
        holder: caller,
        amount,
        pool_id,
        block_height: ctx.block_height,
    });
    Ok(())
}

/// Supply caller's funds, tagged with `holder`.
///
/// `holder` is accounting metadata only: the funds still come from the caller.
pub fn mint_for_holder<A: CustodyAsset, P: YieldPool>(
    state: &mut VaultState,
    asset: &mut A,
    pool: &mut P,
    ctx: &mut CallContext,
    holder: Address,
    amount: u128,
) -> CustodyResult<()> {
    authorize(state, &ctx.caller, Role::Minter)?;
    let caller = ctx.caller;
    deposit(state, asset, pool, &caller, amount)?;

    ctx.events.emit(CustodyEvent::Minted {
        holder,
        amount,
        pool_id: 0,
        block_height: ctx.block_height,
    });
    Ok(())
}

/// Supply funds pulled from `from`, which must have approved the vault
pub fn mint_from<A: CustodyAsset, P: YieldPool>(
    state: &mut VaultState,
    asset: &mut A,
    pool: &mut P,
    ctx: &mut CallContext,
    pool_id: u64,
    amount: u128,
    from: Address,
) -> CustodyResult<()> {
    authorize(state, &ctx.caller, Role::Minter)?;
    deposit(state, asset, pool, &from, amount)?;

    ctx.events.emit(CustodyEvent::Minted {
        holder: from,
        amount,
        pool_id,
        block_height: ctx.block_height,
    });
    Ok(())
}

/// Redeem `amount` pool tokens held by the vault.
///
/// The vault's token balance is not checked here; the pool rejects overdrafts.
pub fn redeem<A: CustodyAsset, P: YieldPool>(
    state: &mut VaultState,
    asset: &mut A,
    pool: &mut P,
    ctx: &mut CallContext,
    amount: u128,
) -> CustodyResult<()> {
    authorize(state, &ctx.caller, Role::Operator)?;
    ensure_endpoints(state, asset, pool)?;
    guarded(state, |vault| {
        check_status(PoolOperation::Redeem, pool.redeem(asset, vault, amount))
    })?;

    ctx.events.emit(CustodyEvent::Redeemed {
        redeemer: ctx.caller,
        amount,
        block_height: ctx.block_height,
    });
    Ok(())
}

/// Redeem exactly `amount` of underlying back into custody
pub fn redeem_underlying<A: CustodyAsset, P: YieldPool>(
    state: &mut VaultState,
    asset: &mut A,
    pool: &mut P,
    ctx: &mut CallContext,
    amount: u128,
) -> CustodyResult<()> {
    authorize(state, &ctx.caller, Role::Operator)?;
    ensure_endpoints(state, asset, pool)?;
    guarded(state, |vault| {
        check_status(
            PoolOperation::RedeemUnderlying,
            pool.redeem_underlying(asset, vault, amount),
        )
    })?;

    ctx.events.emit(CustodyEvent::RedeemedUnderlying {
        redeemer: ctx.caller,
        amount,
        block_height: ctx.block_height,
    });
    Ok(())
}

// ============ Registry & Configuration ============

/// Replace the holder registry. No dedup, no address validation.
pub fn set_holders(
    state: &mut VaultState,
    ctx: &mut CallContext,
    holders: Vec<Address>,
) -> CustodyResult<()> {
    authorize(state, &ctx.caller, Role::Admin)?;
    state.holders = holders.clone();

    ctx.events.emit(CustodyEvent::HoldersSet {
        holders,
        block_height: ctx.block_height,
    });
    Ok(())
}

pub fn set_token_id(
    state: &mut VaultState,
    ctx: &mut CallContext,
    token_id: u64,
) -> CustodyResult<()> {
    authorize(state, &ctx.caller, Role::Admin)?;
    state.token_id = token_id;

    ctx.events.emit(CustodyEvent::TokenIdSet {
        token_id,
        block_height: ctx.block_height,
    });
    Ok(())
}

/// Batch maintenance placeholder.
///
/// Walks `size` slots without appending anything: the registry, token id
/// and event log are left untouched. Only the role check is observable.
pub fn batch_add_holder(
    state: &mut VaultState,
    ctx: &mut CallContext,
    size: u64,
) -> CustodyResult<()> {
    authorize(state, &ctx.caller, Role::Operator)?;
    debug!(size, "batch_add_holder is a no-op");
    Ok(())
}

// ============ Lifecycle / Upgrade ============

/// Upgrade authorization hook; no state change beyond the check
pub fn authorize_upgrade(
    state: &VaultState,
    ctx: &CallContext,
    _new_implementation: &Address,
) -> CustodyResult<()> {
    authorize(state, &ctx.caller, Role::Admin)
}

/// Authorize and record a new implementation
pub fn upgrade_to(
    state: &mut VaultState,
    ctx: &mut CallContext,
    new_implementation: Address,
) -> CustodyResult<()> {
    authorize_upgrade(state, ctx, &new_implementation)?;
    if new_implementation == ZERO_ADDRESS {
        return Err(CustodyError::InvalidAddress { reason: "implementation is zero" });
    }
    state.implementation = new_implementation;

    ctx.events.emit(CustodyEvent::Upgraded {
        implementation: new_implementation,
        block_height: ctx.block_height,
    });
    Ok(())
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;

    const VAULT: Address = [0xEE; 32];
    const USDT: Address = [0xA1; 32];
    const VUSDT: Address = [0xB2; 32];

    fn admin() -> Address {
        [1u8; 32]
    }

    fn user() -> Address {
        [2u8; 32]
    }

    fn initialized_state() -> VaultState {
        let mut state = VaultState::new(VAULT);
        let mut ctx = CallContext::new(admin(), 1);
        initialize(&mut state, &mut ctx, USDT, VUSDT).unwrap();
        state
    }

    #[test]
    fn test_initialize_grants_all_roles() {
        let mut state = VaultState::new(VAULT);
        let mut ctx = CallContext::new(admin(), 1);

        initialize(&mut state, &mut ctx, USDT, VUSDT).unwrap();

        assert!(state.initialized);
        assert_eq!(state.endpoints(), Some(&AssetEndpoints::new(USDT, VUSDT)));
        for role in Role::ALL {
            assert!(state.has_role(role, &admin()));
        }
        // Initialized + three grants
        assert_eq!(ctx.events.len(), 4);
    }

    #[test]
    fn test_initialize_twice_fails() {
        let mut state = initialized_state();
        let mut ctx = CallContext::new(user(), 2);

        let result = initialize(&mut state, &mut ctx, [7u8; 32], [8u8; 32]);
        assert_eq!(result, Err(CustodyError::AlreadyInitialized));
        assert_eq!(state.endpoints, AssetEndpoints::new(USDT, VUSDT));
        assert!(!state.has_role(Role::Admin, &user()));
    }

    #[test]
    fn test_initialize_rejects_zero_endpoints() {
        let mut state = VaultState::new(VAULT);
        let mut ctx = CallContext::new(admin(), 1);

        let result = initialize(&mut state, &mut ctx, ZERO_ADDRESS, VUSDT);
        assert!(matches!(result, Err(CustodyError::InvalidAddress { .. })));
        assert!(!state.initialized);
    }

    #[test]
    fn test_uninitialized_rejects_admin_ops() {
        let mut state = VaultState::new(VAULT);
        let mut ctx = CallContext::new(admin(), 1);

        assert_eq!(set_token_id(&mut state, &mut ctx, 5), Err(CustodyError::NotInitialized));
        assert_eq!(
            grant_role(&mut state, &mut ctx, Role::Minter, user()),
            Err(CustodyError::NotInitialized)
        );
    }

    #[test]
    fn test_holder_index_out_of_bounds() {
        let mut state = initialized_state();
        let mut ctx = CallContext::new(admin(), 2);
        set_holders(&mut state, &mut ctx, vec![[5u8; 32], [6u8; 32]]).unwrap();

        assert_eq!(state.holder(1).unwrap(), [6u8; 32]);
        assert_eq!(
            state.holder(2),
            Err(CustodyError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(
            state.holder(u64::MAX),
            Err(CustodyError::IndexOutOfBounds { index: u64::MAX, len: 2 })
        );
    }

    #[test]
    fn test_batch_add_holder_is_noop() {
        let mut state = initialized_state();
        let before = state.clone();
        let mut ctx = CallContext::new(admin(), 2);

        batch_add_holder(&mut state, &mut ctx, 10).unwrap();

        assert_eq!(state, before);
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_batch_add_holder_requires_operator() {
        let mut state = initialized_state();
        let mut ctx = CallContext::new(user(), 2);

        assert_eq!(
            batch_add_holder(&mut state, &mut ctx, 1),
            Err(CustodyError::Unauthorized { caller: user(), role: Role::Operator })
        );
    }

    #[test]
    fn test_upgrade_to_records_implementation() {
        let mut state = initialized_state();
        let mut ctx = CallContext::new(admin(), 3);

        upgrade_to(&mut state, &mut ctx, [9u8; 32]).unwrap();
        assert_eq!(state.implementation(), [9u8; 32]);

        let result = upgrade_to(&mut state, &mut ctx, ZERO_ADDRESS);
        assert!(matches!(result, Err(CustodyError::InvalidAddress { .. })));
    }

    #[test]
    fn test_supports_interface() {
        use custody_common::access_control::interface_id;

        assert!(supports_interface(&interface_id(interface_signatures::CUSTODY_VAULT)));
        assert!(supports_interface(&interface_id(interface_signatures::ACCESS_CONTROL)));
        assert!(supports_interface(&interface_id(interface_signatures::INTROSPECTION)));
        assert!(!supports_interface(&[0u8; 4]));
    }

    #[test]
    fn test_pre_authorize() {
        let state = initialized_state();

        let redeem = CustodyCall::new(user(), 5, CustodyAction::Redeem { amount: 1 });
        assert!(matches!(
            pre_authorize(&state, &redeem),
            Err(CustodyError::Unauthorized { role: Role::Operator, .. })
        ));

        let redeem = CustodyCall::new(admin(), 5, CustodyAction::Redeem { amount: 1 });
        assert!(pre_authorize(&state, &redeem).is_ok());

        let mut locked = state.clone();
        locked.entered = true;
        assert_eq!(pre_authorize(&locked, &redeem), Err(CustodyError::ReentrantCall));

        let reinit = CustodyCall::new(
            user(),
            5,
            CustodyAction::Initialize { custody_asset: USDT, yield_pool: VUSDT },
        );
        assert_eq!(pre_authorize(&state, &reinit), Err(CustodyError::AlreadyInitialized));
    }

    #[test]
    fn test_validate_transition_storage_action() {
        let input = initialized_state();
        let call = CustodyCall::new(admin(), 7, CustodyAction::SetTokenId { token_id: 42 });

        let mut output = input.clone();
        output.token_id = 42;
        let events = validate_transition(&input, &output, &call).unwrap();
        assert_eq!(events.len(), 1);

        let mut wrong = input.clone();
        wrong.token_id = 43;
        assert_eq!(
            validate_transition(&input, &wrong, &call).unwrap_err(),
            CustodyError::InvalidStateTransition
        );
    }

    #[test]
    fn test_validate_transition_custody_action() {
        let input = initialized_state();
        let call = CustodyCall::new(admin(), 7, CustodyAction::Mint { pool_id: 1, amount: 100 });

        // Storage is untouched by custody actions
        assert!(validate_transition(&input, &input, &call).is_ok());

        let mut mutated = input.clone();
        mutated.holders.push(user());
        assert_eq!(
            validate_transition(&input, &mutated, &call).unwrap_err(),
            CustodyError::InvalidStateTransition
        );

        let outsider = CustodyCall::new(user(), 7, CustodyAction::Mint { pool_id: 1, amount: 100 });
        assert!(matches!(
            validate_transition(&input, &input, &outsider),
            Err(CustodyError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_resolve_input_prefers_spent_vault() {
        let live = initialized_state();
        let init = CustodyAction::Initialize { custody_asset: USDT, yield_pool: VUSDT };

        // Nothing spent: initialize starts from a fresh vault
        assert_eq!(resolve_input(&init, None, VAULT).unwrap(), VaultState::new(VAULT));

        // A live vault is spent: initialize runs against it
        assert_eq!(resolve_input(&init, Some(live.clone()), VAULT).unwrap(), live);

        let redeem = CustodyAction::Redeem { amount: 1 };
        assert_eq!(resolve_input(&redeem, None, VAULT), Err(CustodyError::NotInitialized));
    }

    #[test]
    fn test_reinitialize_over_live_vault_rejected() {
        let live = initialized_state();
        let call = CustodyCall::new(
            user(),
            9,
            CustodyAction::Initialize { custody_asset: USDT, yield_pool: VUSDT },
        );

        // Output a fresh vault owned by someone else
        let mut hijacked = VaultState::new(VAULT);
        let mut ctx = CallContext::new(user(), 9);
        initialize(&mut hijacked, &mut ctx, USDT, VUSDT).unwrap();

        let input = resolve_input(&call.action, Some(live), VAULT).unwrap();
        assert_eq!(
            validate_transition(&input, &hijacked, &call).unwrap_err(),
            CustodyError::AlreadyInitialized
        );
    }

    #[test]
    fn test_apply_dispatches_every_storage_action() {
        use custody_common::ledger::{MemoryAsset, MemoryPool};

        let actions = [
            CustodyAction::GrantRole { role: Role::Minter, account: user() },
            CustodyAction::RevokeRole { role: Role::Operator, account: admin() },
            CustodyAction::RenounceRole { role: Role::Minter },
            CustodyAction::SetHolders { holders: vec![user(), user()] },
            CustodyAction::SetTokenId { token_id: 11 },
            CustodyAction::BatchAddHolder { size: 4 },
            CustodyAction::AuthorizeUpgrade { new_implementation: [9u8; 32] },
            CustodyAction::UpgradeTo { new_implementation: [9u8; 32] },
        ];

        for action in actions {
            let mut via_apply = initialized_state();
            let mut asset = MemoryAsset::new(USDT);
            let mut pool = MemoryPool::new(VUSDT, USDT);
            let mut ctx = CallContext::new(admin(), 5);
            apply(&mut via_apply, &mut asset, &mut pool, &mut ctx, &action).unwrap();

            let mut via_storage = initialized_state();
            let mut storage_ctx = CallContext::new(admin(), 5);
            let result = apply_storage_action(&mut via_storage, &mut storage_ctx, &action);
            assert_eq!(result, Some(Ok(())));

            assert_eq!(via_apply, via_storage, "{} diverged", action.name());
            assert_eq!(ctx.events.events(), storage_ctx.events.events());
        }

        let mut state = initialized_state();
        let mut ctx = CallContext::new(admin(), 5);
        let custody = CustodyAction::Redeem { amount: 1 };
        assert!(apply_storage_action(&mut state, &mut ctx, &custody).is_none());
    }
}
