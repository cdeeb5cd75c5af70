//! Mutex-guarded arena composition.

use std::ptr::NonNull;
use std::sync::{Mutex, PoisonError};

use loam_core::BlockLayout;

use crate::arena::{Arena, TypedRequest};
use crate::monotonic::MonotonicArena;
use crate::safe::SafeArena;

/// An arena wrapper that serializes every operation through one mutex.
///
/// The lock is held across the entire underlying call, so observable
/// allocation order between threads matches lock acquisition order. This
/// is the coarsest possible scheme; it satisfies the correctness contract
/// without attempting to scale.
pub struct ConcurrentArena<A> {
    inner: Mutex<A>,
}

impl<A: Arena> ConcurrentArena<A> {
    /// Wrap an arena. Prefer
    /// [`IntoConcurrent::into_concurrent`], which is idempotent.
    pub fn new(arena: A) -> Self {
        Self {
            inner: Mutex::new(arena),
        }
    }

    /// Unwrap, returning the inner arena.
    pub fn into_inner(self) -> A {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, A> {
        // A panic mid-allocation leaves the bump state consistent (cursors
        // only move after bounds checks), so a poisoned lock is recoverable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Arena> Arena for ConcurrentArena<A> {
    fn alloc_typed(&self, request: &TypedRequest, n: usize) -> Option<NonNull<u8>> {
        self.lock().alloc_typed(request, n)
    }

    fn alloc_pod(&self, layout: BlockLayout, n: usize) -> Option<NonNull<u8>> {
        self.lock().alloc_pod(layout, n)
    }

    fn reset(&mut self) {
        self.inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
    }
}

/// Conversion into a thread-safe arena.
///
/// Wrapping is idempotent at the type level: converting a
/// [`ConcurrentArena`] returns it unchanged, so double-wrapping can never
/// stack mutexes.
pub trait IntoConcurrent: Arena + Sized {
    /// The thread-safe form of this arena.
    type Output: Arena;

    /// Wrap this arena in a mutex, or return it unchanged if it already
    /// is wrapped.
    fn into_concurrent(self) -> Self::Output;
}

impl IntoConcurrent for SafeArena {
    type Output = ConcurrentArena<SafeArena>;

    fn into_concurrent(self) -> Self::Output {
        ConcurrentArena::new(self)
    }
}

impl IntoConcurrent for MonotonicArena {
    type Output = ConcurrentArena<MonotonicArena>;

    fn into_concurrent(self) -> Self::Output {
        ConcurrentArena::new(self)
    }
}

impl<A: Arena> IntoConcurrent for ConcurrentArena<A> {
    type Output = Self;

    fn into_concurrent(self) -> Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_preserves_allocations() {
        let arena = SafeArena::new();
        arena
            .alloc_pod(BlockLayout::pod_of::<u64>(), 4)
            .unwrap();
        let wrapped = arena.into_concurrent();
        let used = wrapped.lock().used_bytes();
        assert_eq!(used, 4 * std::mem::size_of::<u64>());
    }

    #[test]
    fn double_wrapping_is_identity() {
        fn same_type<T>(_: &T, _: fn() -> T) {}

        let wrapped = SafeArena::new().into_concurrent();
        wrapped.alloc_pod(BlockLayout::pod_of::<u32>(), 1).unwrap();

        let rewrapped = wrapped.into_concurrent();
        // Still a single-layer wrapper with the same contents.
        same_type(&rewrapped, || SafeArena::new().into_concurrent());
        assert_eq!(
            rewrapped.lock().used_bytes(),
            std::mem::size_of::<u32>(),
        );
    }

    #[test]
    fn reset_flows_through_the_wrapper() {
        let mut wrapped = MonotonicArena::new(64, 1).into_concurrent();
        wrapped.alloc_pod(BlockLayout::pod_of::<u64>(), 1).unwrap();
        wrapped.reset();
        assert_eq!(wrapped.lock().used_bytes(), 0);
    }

    #[test]
    fn concurrent_allocations_are_disjoint() {
        use std::collections::HashSet;
        use std::sync::Mutex as StdMutex;

        let arena = SafeArena::new().into_concurrent();
        let seen = StdMutex::new(HashSet::new());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..64 {
                        let p = arena
                            .alloc_pod(BlockLayout::pod_of::<u64>(), 1)
                            .unwrap();
                        assert!(seen.lock().unwrap().insert(p.as_ptr() as usize));
                    }
                });
            }
        });

        assert_eq!(seen.lock().unwrap().len(), 4 * 64);
    }
}
