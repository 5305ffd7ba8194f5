use super::handle::HandleLike;
use super::handle_pool::{HandlePool, Iter};

/// A handle-addressed object collection. Every `create` owns exactly one
/// instance of `T` under a fresh handle; `free` destroys it and recycles
/// the slot. The entry is nulled before its index re-enters the free list,
/// so a recycled index never aliases a previous tenant.
#[derive(Default)]
pub struct ObjectPool<H: HandleLike, T: Sized> {
    handles: HandlePool<H>,
    entries: Vec<Option<T>>,
}

impl<H: HandleLike, T: Sized> ObjectPool<H, T> {
    /// Constructs a new, empty `ObjectPool`.
    pub fn new() -> Self {
        ObjectPool {
            handles: HandlePool::new(),
            entries: Vec::new(),
        }
    }

    /// Constructs a new `ObjectPool` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        ObjectPool {
            handles: HandlePool::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Stores `value` and names it with a fresh handle.
    pub fn create(&mut self, value: T) -> H {
        let handle = self.handles.create();

        if handle.index() as usize >= self.entries.len() {
            self.entries.push(Some(value));
        } else {
            self.entries[handle.index() as usize] = Some(value);
        }

        handle
    }

    /// Returns an immutable reference to the value named by `handle`, or
    /// `None` if the handle is stale or was never allocated. A miss never
    /// silently resolves to a different resource.
    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        if self.handles.is_alive(handle) {
            self.entries[handle.index() as usize].as_ref()
        } else {
            None
        }
    }

    /// Returns a mutable reference to the value named by `handle`.
    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if self.handles.is_alive(handle) {
            self.entries[handle.index() as usize].as_mut()
        } else {
            None
        }
    }

    /// Returns true if `handle` was created by this pool and has not been
    /// freed yet.
    #[inline]
    pub fn is_alive(&self, handle: H) -> bool {
        self.handles.is_alive(handle)
    }

    /// Destroys the value named by `handle` and recycles its slot.
    pub fn free(&mut self, handle: H) -> Option<T> {
        if !self.handles.is_alive(handle) {
            return None;
        }

        let value = self.entries[handle.index() as usize].take();
        self.handles.free(handle);
        value
    }

    /// Frees every entry matching `predicate`, returning the freed handles.
    pub fn free_if<P>(&mut self, mut predicate: P) -> Vec<H>
    where
        P: FnMut(&T) -> bool,
    {
        let mut freed = Vec::new();

        for index in 0..self.entries.len() {
            let matches = match self.entries[index] {
                Some(ref v) => predicate(v),
                None => false,
            };

            if matches {
                self.entries[index] = None;
                if let Some(handle) = self.handles.free_at(index) {
                    freed.push(handle);
                }
            }
        }

        freed
    }

    /// Returns the total number of alive entries in this pool.
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Checks if the pool is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over all alive handles.
    #[inline]
    pub fn iter(&self) -> Iter<H> {
        self.handles.iter()
    }
}
