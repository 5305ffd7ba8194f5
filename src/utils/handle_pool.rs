use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::marker::PhantomData;

use super::handle::{HandleIndex, HandleLike};

#[derive(PartialEq, Eq)]
struct InverseHandleIndex(HandleIndex);

impl PartialOrd for InverseHandleIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        other.0.partial_cmp(&self.0)
    }
}

impl Ord for InverseHandleIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}

/// `HandlePool` hands out handles with a continuous `index` field and keeps
/// track of their liveness. Freed indices are recycled lowest-first, before
/// the backing storage is allowed to grow.
///
/// A slot's version is odd while the slot is alive and even while it is
/// free; freeing bumps it, so handles minted for an earlier tenancy of the
/// slot always miss.
pub struct HandlePool<H: HandleLike> {
    versions: Vec<HandleIndex>,
    frees: BinaryHeap<InverseHandleIndex>,
    _handles: PhantomData<H>,
}

impl<H: HandleLike> Default for HandlePool<H> {
    fn default() -> Self {
        HandlePool {
            versions: Vec::new(),
            frees: BinaryHeap::new(),
            _handles: PhantomData,
        }
    }
}

impl<H: HandleLike> HandlePool<H> {
    /// Constructs a new, empty `HandlePool`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Constructs a new `HandlePool` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        HandlePool {
            versions: Vec::with_capacity(capacity),
            frees: BinaryHeap::with_capacity(capacity),
            _handles: PhantomData,
        }
    }

    /// Creates an unused handle, reusing the lowest freed index if there is
    /// one.
    pub fn create(&mut self) -> H {
        if let Some(InverseHandleIndex(index)) = self.frees.pop() {
            self.versions[index as usize] += 1;
            H::new(index, self.versions[index as usize])
        } else {
            self.versions.push(1);
            H::new(self.versions.len() as HandleIndex - 1, 1)
        }
    }

    /// Returns true if `handle` was created by this pool and has not been
    /// freed since.
    pub fn is_alive(&self, handle: H) -> bool {
        let index = handle.index() as usize;
        self.is_alive_at(index) && (self.versions[index] == handle.version())
    }

    #[inline]
    fn is_alive_at(&self, index: usize) -> bool {
        (index < self.versions.len()) && ((self.versions[index] & 0x1) == 1)
    }

    /// Recycles the index of `handle` and marks its version as dead.
    /// Returns false if the handle is stale or was never allocated.
    pub fn free(&mut self, handle: H) -> bool {
        if !self.is_alive(handle) {
            false
        } else {
            self.versions[handle.index() as usize] += 1;
            self.frees.push(InverseHandleIndex(handle.index()));
            true
        }
    }

    /// Recycles the slot at `index` regardless of which handle names it.
    /// Returns the handle that was alive there, if any.
    pub fn free_at(&mut self, index: usize) -> Option<H> {
        if !self.is_alive_at(index) {
            None
        } else {
            self.versions[index] += 1;
            self.frees.push(InverseHandleIndex(index as HandleIndex));
            Some(H::new(index as HandleIndex, self.versions[index] - 1))
        }
    }

    /// Returns the total number of alive handles in this pool.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len() - self.frees.len()
    }

    /// Checks if the pool has no alive handles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over all alive handles.
    #[inline]
    pub fn iter(&self) -> Iter<H> {
        Iter {
            versions: &self.versions,
            index: 0,
            _handles: PhantomData,
        }
    }
}

/// Immutable iterator over the alive handles of a `HandlePool`.
pub struct Iter<'a, H: HandleLike> {
    versions: &'a [HandleIndex],
    index: usize,
    _handles: PhantomData<H>,
}

impl<'a, H: HandleLike> Iterator for Iter<'a, H> {
    type Item = H;

    fn next(&mut self) -> Option<H> {
        while self.index < self.versions.len() {
            let (index, version) = (self.index, self.versions[self.index]);
            self.index += 1;

            if version & 0x1 == 1 {
                return Some(H::new(index as HandleIndex, version));
            }
        }

        None
    }
}

#[cfg(test)]
mod test {
    use super::super::handle::Handle;
    use super::*;

    #[test]
    fn reuse_lowest_before_growth() {
        let mut pool = HandlePool::<Handle>::new();
        let h0 = pool.create();
        let h1 = pool.create();
        let h2 = pool.create();
        assert_eq!((h0.index(), h1.index(), h2.index()), (0, 1, 2));

        assert!(pool.free(h2));
        assert!(pool.free(h0));

        // The lowest freed index comes back first; growth only afterwards.
        assert_eq!(pool.create().index(), 0);
        assert_eq!(pool.create().index(), 2);
        assert_eq!(pool.create().index(), 3);
    }

    #[test]
    fn stale_handles_miss() {
        let mut pool = HandlePool::<Handle>::new();
        let h0 = pool.create();
        assert!(pool.is_alive(h0));
        assert!(pool.free(h0));
        assert!(!pool.is_alive(h0));
        assert!(!pool.free(h0));

        let h0v2 = pool.create();
        assert_eq!(h0v2.index(), h0.index());
        assert_ne!(h0v2.version(), h0.version());
        assert!(!pool.is_alive(h0));
        assert!(pool.is_alive(h0v2));
    }

    #[test]
    fn iter_skips_dead_slots() {
        let mut pool = HandlePool::<Handle>::new();
        let handles: Vec<_> = (0..4).map(|_| pool.create()).collect();
        pool.free(handles[1]);
        pool.free(handles[3]);

        let alive: Vec<_> = pool.iter().map(|v: Handle| v.index()).collect();
        assert_eq!(alive, vec![0, 2]);
        assert_eq!(pool.len(), 2);
    }
}
