//! Persisted record types for per-container identity state.
//!
//! Field names follow the JSON layout already present in users' storage
//! (`hiddenTabs`, `macAddonUUID`, `hiddenState`), so records written by older
//! builds decode unchanged.

pub mod errors;
pub mod container_state;
pub mod tab;

pub use container_state::ContainerState;
pub use tab::{TabDescriptor, TabSnapshot};
