//! Storage layer for the console server.
//!
//! - [`RecordStore`]: JSON documents grouped into collections, queried with
//!   [`Predicate`](catalyst_core::query::Predicate) and
//!   [`QueryDescriptor`](catalyst_core::query::QueryDescriptor)
//! - [`FileStore`]: uploaded files addressed by id
//! - [`seed`]: preloading collections at startup

pub mod engines;
pub mod file_store;
pub mod record_store;
pub mod seed;

pub use engines::MemoryRecordStore;
pub use file_store::{FileStore, MemoryFileStore, StoredFile};
pub use record_store::{
    apply_patch, find_as, find_one_as, load, set_path, DocumentMutation, RecordStore, ID_FIELD,
};
