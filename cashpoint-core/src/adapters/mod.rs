//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - JSON file for the LedgerRepository port
//! - In-memory store for tests

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileRepository;
pub use memory::MemoryRepository;
