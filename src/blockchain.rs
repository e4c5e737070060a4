// Thin re-export module: implementation is in `blockchain/core.rs`, split
// into chain management and validation.

pub mod core;
pub use self::core::*;
