use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;

/// Index type of `Handle`. Keeping it 32-bits makes a `Handle` fit into a
/// single 64-bits word.
pub type HandleIndex = u32;

/// `Handle` is made up of two fields, `index` and `version`. The `index`
/// addresses a slot in some pool. Slots are recycled, so two handles can end
/// up with identical indices; `version` disambiguates them. It is bumped
/// every time the slot is freed, which means a stale handle never resolves
/// to the resource that took over its slot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle {
    index: HandleIndex,
    version: HandleIndex,
}

impl Handle {
    /// Constructs a new `Handle`.
    #[inline]
    pub fn new(index: HandleIndex, version: HandleIndex) -> Self {
        Handle { index, version }
    }

    /// Constructs a nil `Handle` that will never name a live resource.
    #[inline]
    pub fn nil() -> Self {
        Handle {
            index: 0,
            version: 0,
        }
    }

    /// Returns true if this `Handle` has been initialized.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.index > 0 || self.version > 0
    }

    /// Resets this `Handle` to the nil value.
    #[inline]
    pub fn invalidate(&mut self) {
        self.index = 0;
        self.version = 0;
    }

    /// Returns the index value.
    #[inline]
    pub fn index(self) -> HandleIndex {
        self.index
    }

    /// Returns the version value.
    #[inline]
    pub fn version(self) -> HandleIndex {
        self.version
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle ({}, {})", self.index, self.version)
    }
}

/// Types that behave like a `Handle` and can name entries of one pool.
/// Usually generated with [`impl_handle!`](../../macro.impl_handle.html) so
/// that handles of different pools are distinct types.
pub trait HandleLike: Debug + Copy + Hash + PartialEq + Eq + Send + Sync {
    fn new(index: HandleIndex, version: HandleIndex) -> Self;
    fn index(&self) -> HandleIndex;
    fn version(&self) -> HandleIndex;
}

impl HandleLike for Handle {
    #[inline]
    fn new(index: HandleIndex, version: HandleIndex) -> Self {
        Handle { index, version }
    }

    #[inline]
    fn index(&self) -> HandleIndex {
        self.index
    }

    #[inline]
    fn version(&self) -> HandleIndex {
        self.version
    }
}

/// Declares a type-safe wrapper around `Handle`, so that a `TextureHandle`
/// can not be used to address a shader pool by accident.
#[macro_export]
macro_rules! impl_handle {
    ($name:ident) => {
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($crate::utils::handle::Handle);

        impl From<$name> for $crate::utils::handle::Handle {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl From<$crate::utils::handle::Handle> for $name {
            fn from(handle: $crate::utils::handle::Handle) -> Self {
                $name(handle)
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::utils::handle::Handle;

            fn deref(&self) -> &$crate::utils::handle::Handle {
                &self.0
            }
        }

        impl $crate::utils::handle::HandleLike for $name {
            #[inline]
            fn new(
                index: $crate::utils::handle::HandleIndex,
                version: $crate::utils::handle::HandleIndex,
            ) -> Self {
                $name($crate::utils::handle::Handle::new(index, version))
            }

            #[inline]
            fn index(&self) -> $crate::utils::handle::HandleIndex {
                self.0.index()
            }

            #[inline]
            fn version(&self) -> $crate::utils::handle::HandleIndex {
                self.0.version()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{} ({}, {})", stringify!($name), self.index(), self.version())
            }
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        let mut h = Handle::new(2, 4);
        assert_eq!(h.index(), 2);
        assert_eq!(h.version(), 4);
        assert!(h.is_valid());

        h.invalidate();
        assert_eq!(h.index(), 0);
        assert_eq!(h.version(), 0);
        assert!(!h.is_valid());
        assert_eq!(h, Handle::nil());
    }

    impl_handle!(TypeSafeHandle);

    #[test]
    fn type_safe() {
        let h = TypeSafeHandle::default();
        assert_eq!(h, TypeSafeHandle::from(Handle::default()));
        assert_eq!(*h, Handle::default());
    }
}
