//! Service layer for per-container identity state.
//! - Storage backends behind one async trait (in-memory and JSON file).
//! - `identity` holds the storage adapter and the business operations.
//! - External collaborators (tab query, URL policy) are injected traits.

pub mod errors;
pub mod storage;
pub mod tabs;
pub mod policy;
pub mod identity;
