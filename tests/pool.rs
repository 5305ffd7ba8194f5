use ember::impl_handle;
use ember::utils::object_pool::ObjectPool;

impl_handle!(ProxyHandle);

#[test]
fn recycled_indices_come_back_lowest_first() {
    let mut pool = ObjectPool::<ProxyHandle, u32>::new();

    let h0 = pool.create(100);
    let h1 = pool.create(101);
    assert_eq!((h0.index(), h1.index()), (0, 1));

    pool.free(h0);
    assert_eq!(pool.create(102).index(), 0);

    // Growth happens only after every recycled index is in use again.
    assert_eq!(pool.create(103).index(), 2);
}

#[test]
fn get_after_release_misses() {
    let mut pool = ObjectPool::<ProxyHandle, &str>::new();

    let h = pool.create("tenant");
    assert_eq!(pool.get(h), Some(&"tenant"));

    assert_eq!(pool.free(h), Some("tenant"));
    assert_eq!(pool.get(h), None);
    assert_eq!(pool.free(h), None);
}

#[test]
fn stale_handles_never_alias_the_new_tenant() {
    let mut pool = ObjectPool::<ProxyHandle, &str>::new();

    let first = pool.create("first");
    pool.free(first);

    let second = pool.create("second");
    assert_eq!(second.index(), first.index());
    assert_ne!(second.version(), first.version());

    assert_eq!(pool.get(first), None);
    assert!(!pool.is_alive(first));
    assert_eq!(pool.get(second), Some(&"second"));
}

#[test]
fn interleaved_create_release_keeps_entries_distinct() {
    let mut pool = ObjectPool::<ProxyHandle, usize>::new();

    let handles: Vec<_> = (0..8).map(|v| pool.create(v)).collect();
    for h in handles.iter().step_by(2) {
        pool.free(*h);
    }

    let replacements: Vec<_> = (100..104).map(|v| pool.create(v)).collect();
    assert_eq!(pool.len(), 8);

    for (i, h) in handles.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(pool.get(*h), None);
        } else {
            assert_eq!(pool.get(*h), Some(&i));
        }
    }

    for (i, h) in replacements.iter().enumerate() {
        assert_eq!(pool.get(*h), Some(&(100 + i)));
    }
}
