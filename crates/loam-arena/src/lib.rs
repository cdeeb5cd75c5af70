//! Region-based bump allocators with bulk reset.
//!
//! Many short-lived objects, one reclamation boundary: allocation requests
//! are serviced by advancing a cursor through pre-allocated slabs, and the
//! whole region is reclaimed in a single [`Arena::reset`]. Two arenas are
//! provided, the growing, type-routing [`SafeArena`] and the
//! fixed-capacity [`MonotonicArena`] with host fallover, plus a
//! mutex-guarded [`ConcurrentArena`] composition.
//!
//! This is the only crate in the workspace that contains `unsafe` code;
//! it is confined to the slab storage, the monotonic buffers, and the
//! entry-point initialization paths.
//!
//! # Lifetime contract
//!
//! Every reference handed out borrows the arena and is valid until the
//! arena's next reset. Reset takes `&mut self`, so the borrow checker
//! rejects any use of an allocation past that boundary. Element
//! destructors are never run: reset zeroes or releases storage wholesale,
//! so arena-resident values that own host resources will leak them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod alloc;
pub mod arena;
pub mod concurrent;
pub mod config;
pub mod handle;
pub mod monotonic;
pub mod safe;

mod group;
mod slab;

// Re-export the public surface at crate root for convenience.
pub use alloc::{make_slice, make_slice_pod, new_one, new_one_pod, slice_append};
pub use arena::{Arena, TypedRequest};
pub use concurrent::{ConcurrentArena, IntoConcurrent};
pub use config::{MonotonicConfig, SafeArenaConfig};
pub use handle::{ArenaBox, ArenaSlice};
pub use monotonic::MonotonicArena;
pub use safe::SafeArena;
