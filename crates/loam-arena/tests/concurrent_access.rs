//! Integration test: mutex-guarded arenas under concurrent allocation.

use std::collections::HashSet;
use std::sync::Mutex;

use loam_arena::{make_slice_pod, new_one, new_one_pod, Arena, IntoConcurrent, SafeArena};

#[test]
fn threads_share_one_arena_through_the_wrapper() {
    let arena = SafeArena::new().into_concurrent();
    let addresses = Mutex::new(HashSet::new());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..128 {
                    let value = new_one_pod::<u64, _>(Some(&arena));
                    let addr = &*value as *const u64 as usize;
                    assert!(
                        addresses.lock().unwrap().insert(addr),
                        "two allocations shared address {addr:#x}",
                    );
                }
            });
        }
    });

    assert_eq!(addresses.lock().unwrap().len(), 8 * 128);
}

#[test]
fn typed_allocations_work_across_threads() {
    let arena = SafeArena::new().into_concurrent();

    std::thread::scope(|scope| {
        for t in 0..4 {
            let arena = &arena;
            scope.spawn(move || {
                for i in 0..32 {
                    let mut s = new_one::<String, _>(Some(arena));
                    s.push_str(&format!("thread {t} item {i}"));
                    assert!(s.ends_with(&format!("item {i}")));
                }
            });
        }
    });
}

#[test]
fn concurrent_writes_do_not_interleave_within_a_slice() {
    let arena = SafeArena::new().into_concurrent();

    std::thread::scope(|scope| {
        for t in 0..4u8 {
            let arena = &arena;
            scope.spawn(move || {
                let mut bytes = make_slice_pod::<u8, _>(Some(arena), 256, 256);
                bytes.fill(t);
                assert!(bytes.iter().all(|&b| b == t));
            });
        }
    });
}

#[test]
fn reset_after_threads_finish_reclaims_everything() {
    let mut arena = SafeArena::new().into_concurrent();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..16 {
                    let _ = new_one_pod::<[u8; 64], _>(Some(&arena));
                }
            });
        }
    });

    arena.reset();
    let value = new_one_pod::<u64, _>(Some(&arena));
    assert_eq!(*value, 0);
}
