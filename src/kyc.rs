use log::debug;

use crate::{
    address::Address,
    event::Event,
    ledger::SaleLedger,
    storage::{keys, LedgerStore},
};

/// Whether contributions from `address` are admitted.
pub fn status<S: LedgerStore>(ledger: &SaleLedger<S>, address: &Address) -> bool {
    ledger.get_flag(&keys::kyc(address))
}

/// Allowlist a batch of addresses. Already-registered entries are re-stamped
/// and still counted, matching how batch registrations always behaved.
pub fn register<S: LedgerStore>(
    ledger: &mut SaleLedger<S>,
    events: &mut Vec<Event>,
    addresses: &[Address],
) -> usize {
    for address in addresses {
        ledger.set_flag(&keys::kyc(address));
        events.push(Event::KycRegistered { address: *address });
    }
    debug!("registered {} addresses for KYC", addresses.len());
    addresses.len()
}

/// Remove a batch of addresses from the allowlist. Unknown entries are
/// counted too; the batch result reports processed entries, not state
/// transitions.
pub fn deregister<S: LedgerStore>(
    ledger: &mut SaleLedger<S>,
    events: &mut Vec<Event>,
    addresses: &[Address],
) -> usize {
    for address in addresses {
        ledger.clear_flag(&keys::kyc(address));
        events.push(Event::KycDeregistered { address: *address });
    }
    debug!("deregistered {} addresses from KYC", addresses.len());
    addresses.len()
}
