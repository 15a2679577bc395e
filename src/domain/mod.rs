//! Domain layer types and invariants.

pub mod access;
pub mod error;
pub mod posts;
pub mod sections;
pub mod slug;
