//! Slab groups: ordered slab collections with growth and gradual shrink.
//!
//! A group services allocations for one element-type class. Slabs that look
//! full (>3/4 used) are swapped to the front of the list and skipped by
//! later searches; when no slab can serve a request the group grows with a
//! fresh slab sized to at least double total capacity. On reset, a group
//! whose epoch used less than a quarter of its bytes drops its tail slab,
//! one per reset, so capacity trims gradually instead of oscillating.

use std::mem;
use std::ptr::NonNull;

use loam_core::BlockLayout;
use smallvec::SmallVec;

use crate::slab::{Slab, TypedSlab};

/// Utilization denominator for the shrink rule: a group whose high-water
/// mark is below `total_bytes / 4` at reset drops its tail slab.
const SHRINK_DENOMINATOR: usize = 4;

/// Shared bookkeeping for an ordered slab sequence.
///
/// Generic over the slab kind; the scan/swap/trim policy is identical for
/// byte slabs and typed slabs, so it lives here once. The bump call itself
/// differs per front (alignment-corrected vs natural), so the scan takes it
/// as a closure.
pub(crate) struct SlabList<S> {
    slabs: SmallVec<[S; 4]>,
    /// Index of the first slab still worth trying; slabs before it are
    /// presumed full until the next reset.
    first_live: usize,
    total_bytes: usize,
}

impl<S> SlabList<S> {
    fn with_initial(slab: S, byte_len: usize) -> Self {
        let mut slabs = SmallVec::new();
        slabs.push(slab);
        Self {
            slabs,
            first_live: 0,
            total_bytes: byte_len,
        }
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    #[cfg(test)]
    pub fn first_live(&self) -> usize {
        self.first_live
    }

    /// Scan from `first_live`, attempting `try_bump` on each slab. A slab
    /// that fails and then looks full is swapped to the front of the live
    /// range and excluded from future scans; order within the group does
    /// not matter otherwise.
    fn scan(
        &mut self,
        mut try_bump: impl FnMut(&mut S) -> Option<NonNull<u8>>,
        seems_full: impl Fn(&S) -> bool,
    ) -> Option<NonNull<u8>> {
        let mut i = self.first_live;
        while i < self.slabs.len() {
            if let Some(ptr) = try_bump(&mut self.slabs[i]) {
                return Some(ptr);
            }
            if seems_full(&self.slabs[i]) {
                self.slabs.swap(self.first_live, i);
                self.first_live += 1;
            }
            i += 1;
        }
        None
    }

    fn append(&mut self, slab: S, byte_len: usize) {
        self.slabs.push(slab);
        self.total_bytes += byte_len;
    }

    /// Reset every slab via `reset_slab` (which returns its high-water mark
    /// in bytes), then apply the shrink rule: if more than one slab is held
    /// and the epoch's total high-water mark was under a quarter of total
    /// bytes, drop the tail slab. The initial slab is never dropped.
    fn reset(
        &mut self,
        mut reset_slab: impl FnMut(&mut S) -> usize,
        byte_len: impl Fn(&S) -> usize,
    ) {
        let mut high_water = 0usize;
        for slab in &mut self.slabs {
            high_water += reset_slab(slab);
        }
        if self.slabs.len() > 1 && high_water < self.total_bytes / SHRINK_DENOMINATOR {
            if let Some(tail) = self.slabs.pop() {
                self.total_bytes -= byte_len(&tail);
            }
        }
        self.first_live = 0;
    }

    fn used_bytes(&self, used: impl Fn(&S) -> usize) -> usize {
        self.slabs.iter().map(used).sum()
    }
}

/// Slab group for plain-old-data requests, backed by raw byte slabs.
pub(crate) struct PodGroup {
    list: SlabList<Slab>,
}

impl PodGroup {
    /// Create a POD group with one initial slab of `initial_bytes`.
    pub fn new(initial_bytes: usize) -> Self {
        let slab = Slab::new(initial_bytes);
        let len = slab.byte_len();
        Self {
            list: SlabList::with_initial(slab, len),
        }
    }

    /// Allocate `n` values of `layout`, growing the group if required.
    ///
    /// # Panics
    ///
    /// Panics if a just-grown group still cannot service the request; that
    /// is a bug in the library, not a caller error.
    pub fn allocate(&mut self, layout: BlockLayout, n: usize) -> NonNull<u8> {
        let size = layout
            .size()
            .checked_mul(n)
            .expect("allocation size overflows usize");
        let align = layout.align();
        if let Some(ptr) = self.try_allocate(size, align) {
            return ptr;
        }
        // Grow with one extra value's worth of headroom: a fresh byte slab
        // carries no alignment guarantee, so the request must still fit
        // after paying the worst-case padding.
        let reserve = size
            .checked_add(layout.size())
            .expect("allocation size overflows usize");
        self.grow(reserve);
        match self.try_allocate(size, align) {
            Some(ptr) => ptr,
            None => panic!("slab allocation failed!"),
        }
    }

    fn try_allocate(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        self.list.scan(
            |slab| slab.bump_with_align(size, align),
            |slab| slab.seems_full(),
        )
    }

    /// Append a slab of at least `min_bytes`, at least doubling capacity.
    fn grow(&mut self, min_bytes: usize) {
        let bytes = min_bytes.max(self.list.total_bytes());
        let slab = Slab::new(bytes);
        let len = slab.byte_len();
        self.list.append(slab, len);
    }

    /// Reset all slabs and apply the gradual shrink rule.
    pub fn reset(&mut self) {
        self.list.reset(|slab| slab.reset(), |slab| slab.byte_len());
    }

    pub fn total_bytes(&self) -> usize {
        self.list.total_bytes()
    }

    pub fn used_bytes(&self) -> usize {
        self.list.used_bytes(|slab| slab.used_bytes())
    }

    pub fn slab_count(&self) -> usize {
        self.list.slab_count()
    }

    #[cfg(test)]
    pub fn first_live(&self) -> usize {
        self.list.first_live()
    }
}

/// Type-erased interface to a typed slab group, held by the safe arena's
/// per-type map.
pub(crate) trait AnySlabGroup: Send {
    /// Allocate `n` elements, growing if required.
    fn allocate(&mut self, n: usize) -> NonNull<u8>;
    /// Reset all slabs and apply the shrink rule.
    fn reset(&mut self);
    /// Total capacity in bytes.
    fn total_bytes(&self) -> usize;
    /// Bytes handed out since the last reset.
    fn used_bytes(&self) -> usize;
    /// Number of slabs held.
    fn slab_count(&self) -> usize;
}

/// Slab group for one non-POD element type, backed by typed slabs.
pub(crate) struct TypedGroup<T> {
    list: SlabList<TypedSlab<T>>,
}

impl<T> TypedGroup<T> {
    /// Create a typed group with one initial slab of `initial_slots`.
    pub fn new(initial_slots: usize) -> Self {
        let slab = TypedSlab::<T>::new(initial_slots);
        let len = slab.byte_len();
        Self {
            list: SlabList::with_initial(slab, len),
        }
    }

    fn try_allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        self.list.scan(
            |slab| slab.bump_aligned(size),
            |slab| slab.seems_full(),
        )
    }

    /// Append a slab of at least `min_slots`, at least doubling capacity.
    fn grow(&mut self, min_slots: usize) {
        let current_slots = self.list.total_bytes() / mem::size_of::<T>();
        let slots = min_slots.max(current_slots);
        let slab = TypedSlab::<T>::new(slots);
        let len = slab.byte_len();
        self.list.append(slab, len);
    }
}

impl<T: 'static> AnySlabGroup for TypedGroup<T> {
    fn allocate(&mut self, n: usize) -> NonNull<u8> {
        let size = mem::size_of::<T>()
            .checked_mul(n)
            .expect("allocation size overflows usize");
        if let Some(ptr) = self.try_allocate(size) {
            return ptr;
        }
        self.grow(n);
        match self.try_allocate(size) {
            Some(ptr) => ptr,
            None => panic!("slab allocation failed!"),
        }
    }

    fn reset(&mut self) {
        self.list.reset(|slab| slab.reset(), |slab| slab.byte_len());
    }

    fn total_bytes(&self) -> usize {
        self.list.total_bytes()
    }

    fn used_bytes(&self) -> usize {
        self.list.used_bytes(|slab| slab.used_bytes())
    }

    fn slab_count(&self) -> usize {
        self.list.slab_count()
    }
}

/// Monomorphized factory passed through the type-erased request token so
/// the safe arena can create a group for a type it has never seen.
pub(crate) fn make_typed_group<T: 'static>(initial_slots: usize) -> Box<dyn AnySlabGroup> {
    Box::new(TypedGroup::<T>::new(initial_slots))
}
