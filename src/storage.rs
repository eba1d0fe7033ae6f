use std::collections::BTreeMap;

/// Byte-key/value persistence capability supplied by the host ledger runtime.
///
/// The host hands one store to every invocation with exclusive access for the
/// duration of that invocation; writes are atomic per invocation and
/// total-ordered across invocations by the host's transaction ordering. The
/// contract never assumes anything beyond get/put/delete.
pub trait LedgerStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn put(&mut self, key: &[u8], value: &[u8]);
    fn delete(&mut self, key: &[u8]);
}

/// In-memory store used by tests and embedders without a real ledger behind
/// them.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.entries.insert(key.to_vec(), value.to_vec());
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }
}

/// Storage key layout.
///
/// Singleton keys are short ASCII tags; per-address entries are built by
/// concatenating a prefix with the 20-byte address. Balances are keyed by the
/// bare address bytes.
pub mod keys {
    use crate::address::Address;

    pub const OWNER: &[u8] = b"owner";
    pub const NEW_OWNER: &[u8] = b"new_owner";
    pub const SALE_PAUSED: &[u8] = b"sale_paused";
    pub const IN_CIRCULATION: &[u8] = b"in_circulation";
    pub const PRESALE_END: &[u8] = b"presale_end";
    pub const PUBLIC_SALE_START: &[u8] = b"public_sale_start";
    pub const TEAM_DISTRIBUTED: &[u8] = b"team_tokens";
    pub const COMPANY_DISTRIBUTED: &[u8] = b"company_tokens";
    pub const REWARDS_DISTRIBUTED: &[u8] = b"rewards_fund";

    const KYC_PREFIX: &[u8] = b"kyc_ok";

    pub fn kyc(address: &Address) -> Vec<u8> {
        let mut key = Vec::with_capacity(KYC_PREFIX.len() + address.as_bytes().len());
        key.extend_from_slice(KYC_PREFIX);
        key.extend_from_slice(address.as_bytes());
        key
    }

    pub fn phase_contribution(prefix: &[u8], address: &Address) -> Vec<u8> {
        let mut key = Vec::with_capacity(prefix.len() + address.as_bytes().len());
        key.extend_from_slice(prefix);
        key.extend_from_slice(address.as_bytes());
        key
    }

    pub fn balance(address: &Address) -> Vec<u8> {
        address.as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get(b"missing").is_none());

        store.put(b"k", b"v");
        assert_eq!(store.get(b"k").as_deref(), Some(&b"v"[..]));

        store.put(b"k", b"v2");
        assert_eq!(store.get(b"k").as_deref(), Some(&b"v2"[..]));

        store.delete(b"k");
        assert!(store.get(b"k").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_per_address_keys_are_disjoint() {
        let a = Address::new([1u8; 20]);
        let b = Address::new([2u8; 20]);
        assert_ne!(keys::kyc(&a), keys::kyc(&b));
        assert_ne!(keys::kyc(&a), keys::phase_contribution(b"r1", &a));
        assert_ne!(
            keys::phase_contribution(b"r1", &a),
            keys::phase_contribution(b"r2", &a)
        );
        assert_eq!(keys::balance(&a), a.as_bytes());
    }
}
