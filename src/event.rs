use serde::Serialize;

use crate::address::Address;

/// Events emitted towards off-chain observers (explorers, payment handlers,
/// refund tooling). These are the sole integration point with the outside
/// world and are emitted exactly once per committed state change, never
/// speculatively: the admission trigger produces no events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Token issuance or movement. `from` is the contract's own address for
    /// minted tokens.
    Transfer {
        from: Address,
        to: Address,
        amount: u64,
    },
    /// A successful self-service contribution, tracked separately from the
    /// plain transfer so account pages can show sale activity.
    Contribution {
        from: Address,
        native_amount: u64,
        tokens: u64,
    },
    /// A rejected execution-path contribution. The contract does not move the
    /// native asset back; refund processing is off-chain.
    Refund { to: Address, native_amount: u64 },
    KycRegistered { address: Address },
    KycDeregistered { address: Address },
}
