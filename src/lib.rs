pub mod address;
pub mod admission;
pub mod config;
pub mod contract;
pub mod event;
pub mod host;
pub mod kyc;
pub mod ledger;
pub mod ownership;
pub mod phase;
pub mod storage;
pub mod vesting;

pub use address::Address;
pub use contract::{Crowdsale, Operation, Response};
pub use storage::{LedgerStore, MemoryStore};
