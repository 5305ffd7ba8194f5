//! Commonly used utilities: versioned handles, object pools and name hashes.

#[macro_use]
pub mod handle;
pub mod handle_pool;
pub mod hash;
pub mod hash_value;
pub mod object_pool;

pub mod prelude {
    pub use super::handle::{Handle, HandleIndex, HandleLike};
    pub use super::handle_pool::HandlePool;
    pub use super::hash::{hash64, FastHashMap, FastHashSet};
    pub use super::hash_value::HashValue;
    pub use super::object_pool::ObjectPool;
}

pub use self::handle::{Handle, HandleIndex, HandleLike};
pub use self::handle_pool::HandlePool;
pub use self::hash::{hash64, FastHashMap, FastHashSet};
pub use self::hash_value::HashValue;
pub use self::object_pool::ObjectPool;
