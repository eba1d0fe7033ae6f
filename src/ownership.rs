use log::debug;
use thiserror::Error;

use crate::{
    address::Address,
    ledger::SaleLedger,
    storage::{keys, LedgerStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OwnershipError {
    #[error("contract is not deployed")]
    NotDeployed,
    #[error("caller is not the contract owner")]
    NotOwner,
    #[error("no ownership transfer is pending")]
    NoPendingTransfer,
    #[error("caller is not the designated new owner")]
    NotDesignatedOwner,
}

/// The address currently holding owner rights, or `None` before `deploy`
/// writes the owner key. Every owner-gated operation rejects in the
/// undeployed state.
pub fn current_owner<S: LedgerStore>(ledger: &SaleLedger<S>) -> Option<Address> {
    ledger.get_address(keys::OWNER)
}

pub fn pending_owner<S: LedgerStore>(ledger: &SaleLedger<S>) -> Option<Address> {
    ledger.get_address(keys::NEW_OWNER)
}

/// First step of the two-step handover: the current owner designates a
/// successor. Overwrites any earlier designation; rights stay with the
/// current owner until the successor accepts.
pub fn initiate_transfer<S: LedgerStore>(
    ledger: &mut SaleLedger<S>,
    caller: &Address,
    successor: &Address,
) -> Result<(), OwnershipError> {
    let owner = current_owner(ledger).ok_or(OwnershipError::NotDeployed)?;
    if *caller != owner {
        debug!("ownership transfer attempted by non-owner {}", caller);
        return Err(OwnershipError::NotOwner);
    }
    ledger.put_address(keys::NEW_OWNER, successor);
    Ok(())
}

/// Withdraw a pending designation. Only the current owner may cancel, and
/// only while a designation is pending.
pub fn cancel_transfer<S: LedgerStore>(
    ledger: &mut SaleLedger<S>,
    caller: &Address,
) -> Result<(), OwnershipError> {
    let owner = current_owner(ledger).ok_or(OwnershipError::NotDeployed)?;
    if *caller != owner {
        return Err(OwnershipError::NotOwner);
    }
    if pending_owner(ledger).is_none() {
        return Err(OwnershipError::NoPendingTransfer);
    }
    ledger.delete(keys::NEW_OWNER);
    Ok(())
}

/// Second step: the designated successor claims the rights. The pending
/// designation is consumed whether or not further transfers follow.
pub fn accept_transfer<S: LedgerStore>(
    ledger: &mut SaleLedger<S>,
    caller: &Address,
) -> Result<(), OwnershipError> {
    let designated = match pending_owner(ledger) {
        Some(address) => address,
        None => return Err(OwnershipError::NoPendingTransfer),
    };
    if *caller != designated {
        debug!("ownership acceptance attempted by {}", caller);
        return Err(OwnershipError::NotDesignatedOwner);
    }
    ledger.put_address(keys::OWNER, caller);
    ledger.delete(keys::NEW_OWNER);
    Ok(())
}
