//! Workspace placeholder crate.
//!
//! Host applications can depend on `vplay-workspace` and reach the playback
//! controller, the runtime utilities and the engine bridge contract without
//! wiring each crate individually.

pub use bridge_traits as bridge;
pub use core_playback as playback;
pub use core_runtime as runtime;
