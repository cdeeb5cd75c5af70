//! Loam: region-based bump allocators with bulk reset.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the loam sub-crates. For most users, adding `loam` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use loam::prelude::*;
//!
//! let mut arena = SafeArena::new();
//!
//! // Pointer-free data lands in raw POD storage.
//! let mut samples = make_slice::<u64, _>(Some(&arena), 4, 16);
//! samples[0] = 42;
//! assert!(samples.is_arena());
//!
//! // Pointer-bearing types get their own typed slab group.
//! let mut label = new_one::<String, _>(Some(&arena));
//! label.push_str("tick 1");
//!
//! // Without an arena, the same calls fall through to the host.
//! let host_value = new_one::<u64, SafeArena>(None);
//! assert!(!host_value.is_arena());
//!
//! // One reset reclaims everything at once. The borrow checker makes
//! // sure no allocation outlives it.
//! drop((samples, label));
//! arena.reset();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `loam-arena` | Arenas, entry points, handles |
//! | [`introspect`] | `loam-core` | Type shapes, POD verification, layouts |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Arenas, slab storage, and allocation entry points (`loam-arena`).
pub use loam_arena as arena;

/// Type-shape introspection and POD verification (`loam-core`).
pub use loam_core as introspect;

/// Common imports for typical loam usage.
///
/// ```rust
/// use loam::prelude::*;
/// ```
pub mod prelude {
    // Arenas and composition.
    pub use loam_arena::{
        Arena, ConcurrentArena, IntoConcurrent, MonotonicArena, MonotonicConfig, SafeArena,
        SafeArenaConfig,
    };

    // Entry points and handles.
    pub use loam_arena::{
        make_slice, make_slice_pod, new_one, new_one_pod, slice_append, ArenaBox, ArenaSlice,
    };

    // Introspection and verification.
    pub use loam_core::{assert_plain_old_data, check_plain_old_data, Introspect, Pod, Shape};
}
