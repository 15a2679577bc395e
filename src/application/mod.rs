//! Application services: codec, editing session, rendering, metadata and
//! verification codes.

pub mod codec;
pub mod editor;
pub mod error;
pub mod metadata;
pub mod render;
pub mod verification;
