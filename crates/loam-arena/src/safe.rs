//! The safe arena: growing slab groups with POD/typed routing.

use std::any::TypeId;
use std::cell::RefCell;
use std::ptr::NonNull;

use indexmap::IndexMap;
use loam_core::BlockLayout;

use crate::arena::{Arena, TypedRequest};
use crate::config::SafeArenaConfig;
use crate::group::{AnySlabGroup, PodGroup};

/// A dynamically growing arena that routes by pointer-freedom.
///
/// One slab group of raw byte slabs services every POD request; each
/// non-POD element type gets its own group of slabs typed as arrays of
/// that element, created on first sight and keyed by type identity. Groups
/// grow on demand (at least doubling) and shrink gradually on reset when
/// an epoch's utilization was low.
///
/// Not thread-safe: allocation uses single-threaded interior mutability.
/// Compose with [`ConcurrentArena`](crate::ConcurrentArena) for
/// multi-threaded use.
pub struct SafeArena {
    inner: RefCell<SafeInner>,
}

struct SafeInner {
    pod: PodGroup,
    typed: IndexMap<TypeId, Box<dyn AnySlabGroup>>,
    initial_typed_slots: usize,
}

impl SafeArena {
    /// Create an arena with the default configuration
    /// (4096-byte initial POD slab, 64-slot typed groups).
    pub fn new() -> Self {
        Self::with_config(SafeArenaConfig::default())
    }

    /// Create an arena with explicit initial sizes.
    pub fn with_config(config: SafeArenaConfig) -> Self {
        Self {
            inner: RefCell::new(SafeInner {
                pod: PodGroup::new(config.initial_pod_bytes),
                typed: IndexMap::new(),
                initial_typed_slots: config.initial_typed_slots,
            }),
        }
    }

    /// Total capacity across every slab group, in bytes.
    pub fn memory_bytes(&self) -> usize {
        let inner = self.inner.borrow();
        inner.pod.total_bytes()
            + inner
                .typed
                .values()
                .map(|group| group.total_bytes())
                .sum::<usize>()
    }

    /// Bytes handed out since the last reset, across every group.
    pub fn used_bytes(&self) -> usize {
        let inner = self.inner.borrow();
        inner.pod.used_bytes()
            + inner
                .typed
                .values()
                .map(|group| group.used_bytes())
                .sum::<usize>()
    }

    /// Capacity of the POD group in bytes.
    pub fn pod_bytes(&self) -> usize {
        self.inner.borrow().pod.total_bytes()
    }

    /// Number of slabs in the POD group.
    pub fn pod_slab_count(&self) -> usize {
        self.inner.borrow().pod.slab_count()
    }

    /// Number of typed groups created so far (one per distinct non-POD
    /// element type allocated).
    pub fn typed_group_count(&self) -> usize {
        self.inner.borrow().typed.len()
    }
}

impl Default for SafeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena for SafeArena {
    fn alloc_typed(&self, request: &TypedRequest, n: usize) -> Option<NonNull<u8>> {
        let layout = request.layout();
        if layout.size() == 0 || n == 0 {
            return Some(layout.dangling());
        }
        let inner = &mut *self.inner.borrow_mut();
        if layout.is_pod() {
            return Some(inner.pod.allocate(layout, n));
        }
        let initial_slots = inner.initial_typed_slots;
        let group = inner
            .typed
            .entry(request.type_id())
            .or_insert_with(|| request.make_group(initial_slots));
        Some(group.allocate(n))
    }

    fn alloc_pod(&self, layout: BlockLayout, n: usize) -> Option<NonNull<u8>> {
        if layout.size() == 0 || n == 0 {
            return Some(layout.dangling());
        }
        Some(self.inner.borrow_mut().pod.allocate(layout, n))
    }

    fn reset(&mut self) {
        let inner = self.inner.get_mut();
        inner.pod.reset();
        for group in inner.typed.values_mut() {
            group.reset();
        }
    }
}
