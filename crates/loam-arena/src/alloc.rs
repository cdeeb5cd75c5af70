//! Generic allocation entry points.
//!
//! Four front-ends parameterized by element type, each accepting an
//! optional arena. With `None`, or when the arena declines the request,
//! they fall through to the host allocator and return an owning handle.
//! With an arena, they request raw storage through the [`Arena`] routing
//! methods, initialize it, and return a borrowing handle tied to the
//! arena's lifetime.
//!
//! Typed requests are initialized with `T::default()`; POD requests rely
//! on the zeroed-storage invariant and the [`Pod`] contract that all-zero
//! bytes are a valid value.

#![allow(unsafe_code)]

use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use loam_core::{BlockLayout, Introspect, Pod};

use crate::arena::{Arena, TypedRequest};
use crate::handle::{ArenaBox, ArenaSlice};

/// Allocate one `T`, default-initialized.
///
/// Routes by `T`'s shape: pointer-free scalars and arrays land in POD
/// storage, everything else in `T`'s typed slab group (or the host, for
/// arenas without typed storage).
pub fn new_one<'a, T, A>(arena: Option<&'a A>) -> ArenaBox<'a, T>
where
    T: Introspect + Default + 'static,
    A: Arena + ?Sized,
{
    let Some(arena) = arena else {
        return ArenaBox::Host(Box::new(T::default()));
    };
    if mem::size_of::<T>() == 0 {
        return zero_size_one();
    }
    let request = TypedRequest::of::<T>();
    match arena.alloc_typed(&request, 1) {
        Some(ptr) => {
            let ptr = ptr.cast::<T>();
            // Safety: the arena handed out an exclusive, T-aligned region
            // of at least size_of::<T>() bytes, untouched until the next
            // reset, which the borrow checker orders after 'a ends.
            unsafe {
                ptr.as_ptr().write(T::default());
                ArenaBox::Arena(&mut *ptr.as_ptr())
            }
        }
        None => ArenaBox::Host(Box::new(T::default())),
    }
}

/// Allocate one `T` with a caller-asserted pointer-free layout.
///
/// The value reads as all-zero bytes, which the [`Pod`] contract
/// guarantees is valid.
pub fn new_one_pod<'a, T, A>(arena: Option<&'a A>) -> ArenaBox<'a, T>
where
    T: Pod,
    A: Arena + ?Sized,
{
    let Some(arena) = arena else {
        return host_zeroed_one();
    };
    if mem::size_of::<T>() == 0 {
        return zero_size_one_pod();
    }
    match arena.alloc_pod(BlockLayout::pod_of::<T>(), 1) {
        Some(ptr) => {
            // Safety: exclusive region, aligned for T (size is a multiple
            // of alignment, so trailing-edge padding aligns the start too),
            // already zeroed; zero is a valid T per the Pod contract.
            unsafe { ArenaBox::Arena(&mut *ptr.cast::<T>().as_ptr()) }
        }
        None => host_zeroed_one(),
    }
}

/// Allocate a slice of `len` default-initialized values of `T`, with
/// storage reserved for `cap`.
///
/// # Panics
///
/// Panics if `cap < len`.
pub fn make_slice<'a, T, A>(arena: Option<&'a A>, len: usize, cap: usize) -> ArenaSlice<'a, T>
where
    T: Introspect + Default + 'static,
    A: Arena + ?Sized,
{
    assert!(cap >= len, "make_slice: capacity {cap} is less than length {len}");
    let Some(arena) = arena else {
        return host_slice(len, cap);
    };
    if mem::size_of::<T>() == 0 || cap == 0 {
        return zero_size_slice(len, cap);
    }
    let request = TypedRequest::of::<T>();
    match arena.alloc_typed(&request, cap) {
        Some(ptr) => {
            let base = ptr.cast::<T>().as_ptr();
            // Safety: exclusive T-aligned region of cap slots; the first
            // len slots are initialized below, the rest stay as reserved
            // storage that only slice_append may initialize.
            unsafe {
                for i in 0..len {
                    base.add(i).write(T::default());
                }
                ArenaSlice::Arena {
                    data: slice::from_raw_parts_mut(base, len),
                    capacity: cap,
                }
            }
        }
        None => host_slice(len, cap),
    }
}

/// Allocate a slice of `len` zeroed values of `T`, with storage reserved
/// for `cap` and a caller-asserted pointer-free layout.
///
/// # Panics
///
/// Panics if `cap < len`.
pub fn make_slice_pod<'a, T, A>(arena: Option<&'a A>, len: usize, cap: usize) -> ArenaSlice<'a, T>
where
    T: Pod,
    A: Arena + ?Sized,
{
    assert!(
        cap >= len,
        "make_slice_pod: capacity {cap} is less than length {len}",
    );
    let Some(arena) = arena else {
        return host_slice_pod(len, cap);
    };
    if mem::size_of::<T>() == 0 || cap == 0 {
        return zero_size_slice(len, cap);
    }
    match arena.alloc_pod(BlockLayout::pod_of::<T>(), cap) {
        Some(ptr) => {
            // Safety: exclusive aligned region of cap slots, already
            // zeroed; zero is a valid T per the Pod contract.
            unsafe {
                ArenaSlice::Arena {
                    data: slice::from_raw_parts_mut(ptr.cast::<T>().as_ptr(), len),
                    capacity: cap,
                }
            }
        }
        None => host_slice_pod(len, cap),
    }
}

/// Append `items` to a slice, reallocating from the arena when the
/// reserved capacity is exhausted.
///
/// In-place extension writes into the reserved slots beyond the visible
/// length. A reallocation copies the existing elements into a fresh region
/// of at least double the old capacity; the old region is reclaimed at the
/// arena's next reset (there is no per-object free). When the arena
/// declines, or `arena` is `None`, the result moves to a host [`Vec`].
pub fn slice_append<'a, T, A>(
    arena: Option<&'a A>,
    slice: ArenaSlice<'a, T>,
    items: &[T],
) -> ArenaSlice<'a, T>
where
    T: Introspect + Clone + 'static,
    A: Arena + ?Sized,
{
    let (data, capacity) = match slice {
        ArenaSlice::Host(mut vec) => {
            vec.extend_from_slice(items);
            return ArenaSlice::Host(vec);
        }
        ArenaSlice::Arena { data, capacity } => (data, capacity),
    };

    let len = data.len();
    let new_len = len
        .checked_add(items.len())
        .expect("slice length overflows usize");

    if new_len <= capacity {
        let base = data.as_mut_ptr();
        // Safety: slots [len, capacity) belong to this allocation and are
        // uninitialized; writing clones into [len, new_len) and widening
        // the slice keeps every visible element initialized.
        unsafe {
            for (i, item) in items.iter().enumerate() {
                base.add(len + i).write(item.clone());
            }
            return ArenaSlice::Arena {
                data: slice::from_raw_parts_mut(base, new_len),
                capacity,
            };
        }
    }

    let new_cap = new_len.max(capacity.saturating_mul(2));
    let request = TypedRequest::of::<T>();
    match arena.and_then(|a| a.alloc_typed(&request, new_cap)) {
        Some(ptr) => {
            let base = ptr.cast::<T>().as_ptr();
            // Safety: the fresh region is disjoint from the old one. The
            // old elements are moved by bytewise copy and their original
            // storage is abandoned until reset; the arena never runs
            // destructors, so no value is dropped twice.
            unsafe {
                ptr::copy_nonoverlapping(data.as_ptr(), base, len);
                for (i, item) in items.iter().enumerate() {
                    base.add(len + i).write(item.clone());
                }
                ArenaSlice::Arena {
                    data: slice::from_raw_parts_mut(base, new_len),
                    capacity: new_cap,
                }
            }
        }
        None => {
            let mut vec = Vec::with_capacity(new_len);
            // Safety: moves the old elements into the Vec by bytewise
            // copy; the abandoned arena storage is never dropped.
            unsafe {
                ptr::copy_nonoverlapping(data.as_ptr(), vec.as_mut_ptr(), len);
                vec.set_len(len);
            }
            vec.extend_from_slice(items);
            ArenaSlice::Host(vec)
        }
    }
}

fn host_slice<'a, T: Default>(len: usize, cap: usize) -> ArenaSlice<'a, T> {
    let mut vec = Vec::with_capacity(cap);
    vec.resize_with(len, T::default);
    ArenaSlice::Host(vec)
}

fn host_slice_pod<'a, T: Pod>(len: usize, cap: usize) -> ArenaSlice<'a, T> {
    let mut vec = Vec::with_capacity(cap);
    // Safety: zero is a valid T per the Pod contract, and the first len
    // slots are zeroed before the length is set.
    unsafe {
        ptr::write_bytes(vec.as_mut_ptr(), 0, len);
        vec.set_len(len);
    }
    ArenaSlice::Host(vec)
}

fn host_zeroed_one<'a, T: Pod>() -> ArenaBox<'a, T> {
    // Safety: zero is a valid T per the Pod contract.
    ArenaBox::Host(Box::new(unsafe { mem::zeroed::<T>() }))
}

fn zero_size_one<'a, T: Default>() -> ArenaBox<'a, T> {
    let ptr = NonNull::<T>::dangling();
    // Safety: T is zero-sized, so a well-aligned dangling pointer is a
    // valid place for it; the write stores no bytes.
    unsafe {
        ptr.as_ptr().write(T::default());
        ArenaBox::Arena(&mut *ptr.as_ptr())
    }
}

fn zero_size_one_pod<'a, T: Pod>() -> ArenaBox<'a, T> {
    let ptr = NonNull::<T>::dangling();
    // Safety: as in zero_size_one; zero-size Pod values occupy no bytes.
    unsafe {
        ptr.as_ptr().write(mem::zeroed::<T>());
        ArenaBox::Arena(&mut *ptr.as_ptr())
    }
}

fn zero_size_slice<'a, T>(len: usize, cap: usize) -> ArenaSlice<'a, T> {
    debug_assert!(mem::size_of::<T>() == 0 || len == 0);
    // Safety: either T is zero-sized (any length is valid over a dangling,
    // aligned pointer) or the slice is empty. Consumes no arena bytes.
    let data = unsafe { slice::from_raw_parts_mut(NonNull::<T>::dangling().as_ptr(), len) };
    ArenaSlice::Arena {
        data,
        capacity: cap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monotonic::MonotonicArena;
    use crate::safe::SafeArena;

    #[test]
    fn new_one_without_arena_is_host_allocated() {
        let value = new_one::<u64, SafeArena>(None);
        assert!(!value.is_arena());
        assert_eq!(*value, 0);
    }

    #[test]
    fn new_one_default_initializes() {
        let arena = SafeArena::new();
        let value = new_one::<u64, _>(Some(&arena));
        assert!(value.is_arena());
        assert_eq!(*value, 0);
    }

    #[test]
    fn new_one_pod_reads_zero() {
        let arena = SafeArena::new();
        let mut value = new_one_pod::<[u8; 16], _>(Some(&arena));
        assert!(value.is_arena());
        assert!(value.iter().all(|&b| b == 0));
        value[0] = 1;
        assert_eq!(value[0], 1);
    }

    #[test]
    fn make_slice_len_and_capacity() {
        let arena = SafeArena::new();
        let slice = make_slice::<u32, _>(Some(&arena), 3, 10);
        assert_eq!(slice.len(), 3);
        assert_eq!(slice.capacity(), 10);
        assert!(slice.iter().all(|&v| v == 0));
    }

    #[test]
    #[should_panic(expected = "less than length")]
    fn make_slice_rejects_cap_below_len() {
        let arena = SafeArena::new();
        let _ = make_slice::<u32, _>(Some(&arena), 4, 3);
    }

    #[test]
    fn zero_length_slice_consumes_no_bytes() {
        let arena = SafeArena::new();
        let used = arena.used_bytes();
        let slice = make_slice::<u64, _>(Some(&arena), 0, 0);
        assert!(slice.is_empty());
        assert_eq!(arena.used_bytes(), used);
    }

    #[test]
    fn zero_size_types_consume_no_bytes() {
        let arena = SafeArena::new();
        let used = arena.used_bytes();
        let one = new_one::<(), _>(Some(&arena));
        let many = make_slice::<(), _>(Some(&arena), 100, 100);
        assert!(one.is_arena());
        assert_eq!(many.len(), 100);
        assert_eq!(arena.used_bytes(), used);
    }

    #[test]
    fn non_pod_values_survive_in_typed_storage() {
        let arena = SafeArena::new();
        let mut name = new_one::<String, _>(Some(&arena));
        assert!(name.is_arena());
        assert!(name.is_empty());
        name.push_str("loam");
        assert_eq!(&*name, "loam");
        assert_eq!(arena.typed_group_count(), 1);
    }

    #[test]
    fn monotonic_routes_non_pod_to_host() {
        let arena = MonotonicArena::new(1024, 1);
        let boxed = new_one::<Box<u8>, _>(Some(&arena));
        assert!(!boxed.is_arena());
    }

    #[test]
    fn write_then_read_round_trips() {
        let arena = SafeArena::new();
        let mut slice = make_slice_pod::<u8, _>(Some(&arena), 64, 64);
        for (i, byte) in slice.iter_mut().enumerate() {
            *byte = i as u8;
        }
        for (i, byte) in slice.iter().enumerate() {
            assert_eq!(*byte, i as u8);
        }
    }

    #[test]
    fn append_within_capacity_extends_in_place() {
        let arena = SafeArena::new();
        let mut slice = make_slice::<u32, _>(Some(&arena), 2, 8);
        slice[0] = 1;
        slice[1] = 2;
        let base = slice.as_ptr();

        let slice = slice_append(Some(&arena), slice, &[3, 4]);
        assert!(slice.is_arena());
        assert_eq!(&*slice, &[1, 2, 3, 4]);
        assert_eq!(slice.as_ptr(), base);
        assert_eq!(slice.capacity(), 8);
    }

    #[test]
    fn append_beyond_capacity_reallocates_and_doubles() {
        let arena = SafeArena::new();
        let mut slice = make_slice::<u32, _>(Some(&arena), 3, 3);
        slice.copy_from_slice(&[1, 2, 3]);
        let base = slice.as_ptr();

        let slice = slice_append(Some(&arena), slice, &[4, 5]);
        assert!(slice.is_arena());
        assert_eq!(&*slice, &[1, 2, 3, 4, 5]);
        assert_ne!(slice.as_ptr(), base);
        assert!(slice.capacity() >= 6);
    }

    #[test]
    fn append_to_host_slice_stays_host() {
        let slice = make_slice::<u32, SafeArena>(None, 2, 2);
        let slice = slice_append::<u32, SafeArena>(None, slice, &[9]);
        assert!(!slice.is_arena());
        assert_eq!(&*slice, &[0, 0, 9]);
    }

    #[test]
    fn append_falls_through_when_arena_declines() {
        // The single buffer is exactly exhausted by the first slice, so the
        // growing append moves to the host heap.
        let arena = MonotonicArena::new(2 * std::mem::size_of::<u32>(), 1);
        let slice = make_slice::<u32, _>(Some(&arena), 2, 2);
        assert!(slice.is_arena());

        let grown = slice_append(Some(&arena), slice, &[7, 8, 9]);
        assert!(!grown.is_arena());
        assert_eq!(&*grown, &[0, 0, 7, 8, 9]);
    }
}
