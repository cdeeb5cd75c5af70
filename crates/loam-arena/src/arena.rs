//! The arena capability and the per-type request token.

use std::any::TypeId;
use std::fmt;
use std::ptr::NonNull;

use loam_core::{BlockLayout, Introspect};

use crate::group::{make_typed_group, AnySlabGroup};

/// The allocation capability shared by every arena in this crate.
///
/// Three operations: route a typed request, route a POD request, and reset.
/// The allocation methods take `&self` (bare arenas use single-threaded
/// interior mutability) and return raw regions that the generic entry
/// points reinterpret. `reset` takes `&mut self`, so the borrow checker
/// statically prevents any previously handed-out reference from surviving
/// a reset: that is the library's lifetime contract.
///
/// Returning `None` from an allocation method means "this arena declines
/// the request"; the entry points then fall through to the host allocator.
pub trait Arena {
    /// Allocate storage for `n` values of the request's type.
    ///
    /// The returned region is uninitialized-but-zeroed storage aligned for
    /// the type; callers must initialize it before use. `None` signals
    /// host fallthrough.
    fn alloc_typed(&self, request: &TypedRequest, n: usize) -> Option<NonNull<u8>>;

    /// Allocate storage for `n` values of a caller-asserted pointer-free
    /// layout. The returned region reads as all-zero bytes.
    fn alloc_pod(&self, layout: BlockLayout, n: usize) -> Option<NonNull<u8>>;

    /// Discard every live allocation in one step.
    ///
    /// All memory previously handed out becomes free and zeroed (or is
    /// released outright, per the arena's policy). Element destructors are
    /// never run.
    fn reset(&mut self);
}

/// A statically-generated token identifying one element type.
///
/// Each monomorphization of [`TypedRequest::of`] produces a token carrying
/// the type's identity, display name, layout, and a factory the safe arena
/// uses to create that type's slab group on first sight: the library's
/// substitute for a reflective type handle.
pub struct TypedRequest {
    id: TypeId,
    name: &'static str,
    layout: BlockLayout,
    new_group: fn(usize) -> Box<dyn AnySlabGroup>,
}

impl TypedRequest {
    /// Build the request token for `T`.
    pub fn of<T: Introspect + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            layout: BlockLayout::of::<T>(),
            new_group: make_typed_group::<T>,
        }
    }

    /// The type's runtime identity, used to key typed slab groups.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// The type's display name.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// The type's layout, including the routing decision.
    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    pub(crate) fn make_group(&self, initial_slots: usize) -> Box<dyn AnySlabGroup> {
        (self.new_group)(initial_slots)
    }
}

impl fmt::Debug for TypedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedRequest")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .finish()
    }
}
