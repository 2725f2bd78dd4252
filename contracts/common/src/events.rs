//! Vault Events
//!
//! Events are emitted during call execution and can be indexed
//! off-chain. A failed call emits nothing: its log is discarded
//! together with the rest of the staged state.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use crate::types::{Address, Role};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Lifecycle Events (0x01 - 0x0F)
    Initialized = 0x01,
    Upgraded = 0x02,

    // Access Control Events (0x10 - 0x1F)
    RoleGranted = 0x10,
    RoleRevoked = 0x11,

    // Custody Events (0x20 - 0x2F)
    Minted = 0x20,
    Redeemed = 0x21,
    RedeemedUnderlying = 0x22,

    // Registry Events (0x30 - 0x3F)
    HoldersSet = 0x30,
    TokenIdSet = 0x31,
}

/// Main event enum containing all vault events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum CustodyEvent {
    /// Emitted once, when the instance is initialized
    Initialized {
        admin: Address,
        custody_asset: Address,
        yield_pool: Address,
        block_height: u64,
    },

    /// Emitted when the upgrade target changes
    Upgraded {
        implementation: Address,
        block_height: u64,
    },

    /// Emitted when an account gains a role
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
        block_height: u64,
    },

    /// Emitted when an account loses a role
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
        block_height: u64,
    },

    /// Emitted when custody asset is deposited into the yield pool.
    /// `pool_id` is 0 for holder-tagged deposits.
    Minted {
        holder: Address,
        amount: u128,
        pool_id: u64,
        block_height: u64,
    },

    /// Emitted when pool tokens are redeemed
    Redeemed {
        redeemer: Address,
        amount: u128,
        block_height: u64,
    },

    /// Emitted when an exact underlying amount is redeemed
    RedeemedUnderlying {
        redeemer: Address,
        amount: u128,
        block_height: u64,
    },

    /// Emitted when the holder registry is replaced
    HoldersSet {
        holders: Vec<Address>,
        block_height: u64,
    },

    /// Emitted when the token identifier changes
    TokenIdSet {
        token_id: u64,
        block_height: u64,
    },
}

impl CustodyEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Initialized { .. } => EventType::Initialized,
            Self::Upgraded { .. } => EventType::Upgraded,
            Self::RoleGranted { .. } => EventType::RoleGranted,
            Self::RoleRevoked { .. } => EventType::RoleRevoked,
            Self::Minted { .. } => EventType::Minted,
            Self::Redeemed { .. } => EventType::Redeemed,
            Self::RedeemedUnderlying { .. } => EventType::RedeemedUnderlying,
            Self::HoldersSet { .. } => EventType::HoldersSet,
            Self::TokenIdSet { .. } => EventType::TokenIdSet,
        }
    }

    /// Get the block height when event occurred
    pub fn block_height(&self) -> u64 {
        match self {
            Self::Initialized { block_height, .. }
            | Self::Upgraded { block_height, .. }
            | Self::RoleGranted { block_height, .. }
            | Self::RoleRevoked { block_height, .. }
            | Self::Minted { block_height, .. }
            | Self::Redeemed { block_height, .. }
            | Self::RedeemedUnderlying { block_height, .. }
            | Self::HoldersSet { block_height, .. }
            | Self::TokenIdSet { block_height, .. } => *block_height,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<CustodyEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: CustodyEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[CustodyEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<CustodyEvent> {
        self.events
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
