//! Concrete [`RecordStore`](super::RecordStore) engines.

pub mod memory;

pub use memory::MemoryRecordStore;
