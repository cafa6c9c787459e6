// Adapters layer: concrete host tree implementations.

pub mod memory;

pub use memory::{MemoryTree, NodeId};
