//! Catalyst Server: the console REST API over a document store, with the
//! collaborators (crypto, processes, archives, Nexus, node access) behind
//! traits.

pub mod infra;
pub mod network;
pub mod service;
pub mod storage;
pub mod traits;

pub use service::{Collaborators, ConsoleConfig, ConsoleServices};
pub use storage::{FileStore, RecordStore};
