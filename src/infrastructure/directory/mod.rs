//! Directory client implementations

mod in_memory;

pub use in_memory::{DirectoryFixture, InMemoryDirectoryClient};
