//! # Algorithms Module
//!
//! Pure state logic: slot allocation, the validator registry, proposer
//! sampling, per-shard header chains and the receipt queue. Nothing here
//! talks to a collaborator.

pub mod collation_tree;
pub mod receipt_queue;
pub mod registry;
pub mod sampling;
pub mod slot_allocator;

pub use collation_tree::ShardChain;
pub use receipt_queue::ReceiptQueue;
pub use registry::ValidatorRegistry;
pub use sampling::{sample_slot, start_index, RandomnessCache};
pub use slot_allocator::SlotAllocator;
