// # Client Memory
//
// The engine's per-MAC belief about each watched client, and the
// comparison step that turns a fresh snapshot record into an observation.

pub mod memory;

pub use memory::{ClientMemory, MemoryEntry, Observation};
