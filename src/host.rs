use crate::address::Address;

/// The invocation mode under which the host runtime calls the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Read-only gate deciding whether a pending native-asset transfer may
    /// enter the ledger at all. Must not write.
    Admission,
    /// Operation dispatch with full state-committing execution.
    Execution,
}

/// Native-asset amounts attached to the invoking transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachments {
    /// The contributing party.
    pub sender: Address,
    /// The receiving side of the attached transfer, normally the contract's
    /// own address. Minted tokens are reported as transferred from here.
    pub receiver: Address,
    /// Attached native-asset amount in raw (8-decimal) units.
    pub native_attached: u64,
}

/// Per-invocation facts supplied by the host ledger runtime.
///
/// The same context backs both triggers; the host guarantees that an
/// admission evaluation and the subsequent execution of one transaction
/// observe identical pre-commit state.
pub trait HostContext {
    /// Current block height.
    fn block_height(&self) -> u64;

    /// Timestamp of the current block, in seconds.
    fn block_timestamp(&self) -> u64;

    /// Whether the invoking party authorized this call as `address`.
    fn is_witness(&self, address: &Address) -> bool;

    /// Attached native-asset transfer of the invoking transaction.
    fn attachments(&self) -> Attachments;
}

/// Host context with fixed values, for tests and direct embedding.
#[derive(Debug, Clone)]
pub struct StaticHost {
    pub height: u64,
    pub timestamp: u64,
    pub witnesses: Vec<Address>,
    pub attachments: Attachments,
}

impl StaticHost {
    pub fn new(sender: Address, receiver: Address) -> Self {
        Self {
            height: 0,
            timestamp: 0,
            witnesses: Vec::new(),
            attachments: Attachments {
                sender,
                receiver,
                native_attached: 0,
            },
        }
    }
}

impl HostContext for StaticHost {
    fn block_height(&self) -> u64 {
        self.height
    }

    fn block_timestamp(&self) -> u64 {
        self.timestamp
    }

    fn is_witness(&self, address: &Address) -> bool {
        self.witnesses.contains(address)
    }

    fn attachments(&self) -> Attachments {
        self.attachments
    }
}
