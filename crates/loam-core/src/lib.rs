//! Core types for the loam region allocators.
//!
//! This is the leaf crate with zero dependencies. It defines the type-shape
//! model used to decide whether a value type can live in collector-invisible
//! raw memory, the POD verification walk built on top of it, and the layout
//! descriptor the allocation engine routes requests with.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod layout;
pub mod pod;
pub mod shape;

// Re-export core types at crate root for convenience.
pub use layout::BlockLayout;
pub use pod::{assert_plain_old_data, check_plain_old_data, Pod, PodViolation};
pub use shape::{Introspect, Shape};
