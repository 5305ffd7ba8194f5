//! Declarative registration and the shared resource lifecycle.

pub mod lifecycle;
pub mod registry;

pub mod prelude {
    pub use super::lifecycle::{ResourceKind, ResourceState};
    pub use super::registry::{Registry, RegistryBuilder, ResourceDecl};
}
