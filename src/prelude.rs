//! Flat re-exports of the commonly used types.

pub use crate::render::prelude::*;
pub use crate::res::prelude::*;
pub use crate::utils::prelude::*;
