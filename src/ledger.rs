use log::trace;

use crate::{
    address::{Address, ADDRESS_LENGTH},
    event::Event,
    storage::{keys, LedgerStore},
};

/// Typed view over the raw ledger store.
///
/// Counters are stored as little-endian u64; an absent key reads as zero and
/// short values zero-extend. Flags are presence-of-key. Addresses are stored
/// as their 20 raw bytes.
pub struct SaleLedger<'a, S: LedgerStore> {
    store: &'a mut S,
}

impl<'a, S: LedgerStore> SaleLedger<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn get_u64(&self, key: &[u8]) -> u64 {
        match self.store.get(key) {
            Some(raw) => decode_u64(&raw),
            None => 0,
        }
    }

    pub fn put_u64(&mut self, key: &[u8], value: u64) {
        self.store.put(key, &value.to_le_bytes());
    }

    /// Read a counter that distinguishes "never set" from zero, used for the
    /// height markers.
    pub fn get_marker(&self, key: &[u8]) -> Option<u64> {
        self.store.get(key).map(|raw| decode_u64(&raw))
    }

    pub fn get_flag(&self, key: &[u8]) -> bool {
        match self.store.get(key) {
            Some(raw) => raw.iter().any(|b| *b != 0),
            None => false,
        }
    }

    pub fn set_flag(&mut self, key: &[u8]) {
        self.store.put(key, &[1]);
    }

    pub fn clear_flag(&mut self, key: &[u8]) {
        self.store.delete(key);
    }

    pub fn get_address(&self, key: &[u8]) -> Option<Address> {
        let raw = self.store.get(key)?;
        if raw.len() != ADDRESS_LENGTH {
            trace!("stored value under {:?} is not an address", key);
            return None;
        }
        Address::from_bytes(&raw)
    }

    pub fn put_address(&mut self, key: &[u8], address: &Address) {
        self.store.put(key, address.as_bytes());
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.store.delete(key);
    }

    pub fn balance_of(&self, address: &Address) -> u64 {
        self.get_u64(&keys::balance(address))
    }

    pub fn in_circulation(&self) -> u64 {
        self.get_u64(keys::IN_CIRCULATION)
    }

    /// Commit an authorized issuance: recipient balance, circulation counter
    /// and the transfer event move together, never partially. Only reached
    /// after the admission calculation authorized a non-zero amount, so there
    /// is no failure path.
    pub fn mint(&mut self, events: &mut Vec<Event>, from: Address, to: Address, amount: u64) {
        let balance = self.balance_of(&to).saturating_add(amount);
        self.put_u64(&keys::balance(&to), balance);

        let circulation = self.in_circulation().saturating_add(amount);
        self.put_u64(keys::IN_CIRCULATION, circulation);

        events.push(Event::Transfer { from, to, amount });
    }
}

fn decode_u64(raw: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    let len = raw.len().min(8);
    bytes[..len].copy_from_slice(&raw[..len]);
    u64::from_le_bytes(bytes)
}
