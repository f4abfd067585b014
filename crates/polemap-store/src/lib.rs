pub mod memory;
pub mod snapshot;

pub use memory::{LedgerEntry, MemoryInventory, MemoryLedger};
pub use snapshot::StoreError;
