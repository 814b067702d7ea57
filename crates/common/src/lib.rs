//! Shared runtime helpers for the identity-state binaries.

pub mod utils;
