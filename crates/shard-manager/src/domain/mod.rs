//! # Domain Module
//!
//! Core types for the shard manager: identifiers, records, the header codec,
//! commands and the rules every state transition must satisfy.

pub mod entities;
pub mod errors;
pub mod header;
pub mod invariants;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use header::*;
pub use invariants::*;
pub use value_objects::*;
