use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use ember::prelude::*;

#[test]
fn exactly_one_racing_init_succeeds() {
    let state = Arc::new(ResourceState::new(ResourceKind::Texture, "shared.png"));
    let successes = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let state = Arc::clone(&state);
            let successes = Arc::clone(&successes);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();

                while !state.is_initialized() {
                    let won = state
                        .try_init(|| {
                            thread::yield_now();
                            Ok::<_, ()>(())
                        })
                        .unwrap();

                    if won {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert!(state.is_initialized());
    assert_eq!(successes.load(Ordering::SeqCst), 1);
}

#[test]
fn free_always_leaves_the_resource_uninitialized() {
    let state = ResourceState::new(ResourceKind::Shader, "tonemap.fx");
    let mut teardowns = 0;

    // Never initialized: teardown must not run.
    state.free(|| teardowns += 1);
    assert_eq!(teardowns, 0);

    for _ in 0..3 {
        assert!(state.try_init(|| Ok::<_, ()>(())).unwrap());
        state.free(|| teardowns += 1);
        assert!(!state.is_initialized());
    }

    assert_eq!(teardowns, 3);
}

#[test]
fn waiters_block_until_the_winner_finishes() {
    let state = Arc::new(ResourceState::new(ResourceKind::Target, "half-res"));
    let observed = Arc::new(AtomicUsize::new(0));

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let state = Arc::clone(&state);
            let observed = Arc::clone(&observed);

            thread::spawn(move || {
                state.wait_until_initialized();
                assert!(state.is_initialized());
                observed.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    assert!(state.try_init(|| Ok::<_, ()>(())).unwrap());

    for waiter in waiters {
        waiter.join().unwrap();
    }

    assert_eq!(observed.load(Ordering::SeqCst), 4);
}

#[test]
fn share_lock_serializes_discovery() {
    let state = ResourceState::new(ResourceKind::Texture, "atlas.png");

    let guard = state.share_lock();
    assert!(state.try_share_lock().is_none());
    drop(guard);
    assert!(state.try_share_lock().is_some());
}
