//! Slot storage backends for the persisted session.
//!
//! Each backend exposes the same two durable string slots. The in-memory
//! backend serves tests and ephemeral runs; the directory backend keeps one
//! file per slot so a session survives process restarts, the command-line
//! equivalent of a page reload.

mod directory;
mod memory;

pub use directory::DirectorySlotStorage;
pub use memory::MemorySlotStorage;
