//! The process-wide registry of named shader constants and declarative
//! resource declarations.
//!
//! Registration happens exactly once, before the render system is brought
//! up: build a [`Registry`] with [`RegistryBuilder`], then hand it to
//! `RenderSystem::new`. The registry is append-only while being built and
//! immutable afterwards, which removes any dependence on static
//! initialization order. There is no explicit teardown; dropping the last
//! `Arc<Registry>` releases it.
//!
//! [`Registry`]: struct.Registry.html
//! [`RegistryBuilder`]: struct.RegistryBuilder.html

use std::sync::Arc;

use crate::render::assets::shader::{ConstantVariable, ShaderConstant, ShaderParams};
use crate::render::assets::target::TargetParams;
use crate::render::assets::texture::TextureParams;
use crate::utils::prelude::{FastHashMap, HashValue};

/// A named resource declaration, from which pools are populated at system
/// startup. The declared resource stays Uninitialized until first use.
#[derive(Debug, Clone)]
pub enum ResourceDecl {
    Texture(TextureParams),
    Shader(ShaderParams),
    Target(TargetParams),
}

/// The immutable registry. Constants are matched by the 64-bits hash of
/// their name; the first registration under a hash wins and later ones are
/// dropped (see `RegistryBuilder::constant`).
pub struct Registry {
    constants: FastHashMap<HashValue<str>, Arc<ShaderConstant>>,
    decls: Vec<(String, ResourceDecl)>,
}

impl Registry {
    /// Starts building a registry.
    pub fn build() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Looks up a registered constant by name or name hash.
    pub fn constant<T>(&self, name: T) -> Option<&Arc<ShaderConstant>>
    where
        T: Into<HashValue<str>>,
    {
        self.constants.get(&name.into())
    }

    /// Number of registered constants.
    pub fn constants_len(&self) -> usize {
        self.constants.len()
    }

    /// The registered resource declarations, in registration order.
    pub fn decls(&self) -> &[(String, ResourceDecl)] {
        &self.decls
    }
}

/// Builder for [`Registry`](struct.Registry.html). All registration methods
/// are append-only and consume/return the builder, so startup code reads as
/// one chain.
#[derive(Default)]
pub struct RegistryBuilder {
    constants: FastHashMap<HashValue<str>, Arc<ShaderConstant>>,
    decls: Vec<(String, ResourceDecl)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a named constant with its initial value.
    ///
    /// Names are matched by hash. If a later registration hashes onto an
    /// existing one — a duplicate name, or a genuine collision between
    /// distinct names — the earlier registration wins and the later one is
    /// dropped with a warning. Shaders binding against the name will keep
    /// resolving to the first registration.
    pub fn constant<T>(mut self, name: T, initial: ConstantVariable) -> Self
    where
        T: Into<String>,
    {
        let name = name.into();
        let hash = HashValue::from(&name);

        if self.constants.contains_key(&hash) {
            warn!(
                "constant '{}' hashes onto an existing registration; keeping the first",
                name
            );
            return self;
        }

        self.constants
            .insert(hash, Arc::new(ShaderConstant::new(name, initial)));
        self
    }

    /// Declares a named texture.
    pub fn texture<T>(mut self, name: T, params: TextureParams) -> Self
    where
        T: Into<String>,
    {
        self.decls.push((name.into(), ResourceDecl::Texture(params)));
        self
    }

    /// Declares a named shader.
    pub fn shader<T>(mut self, name: T, params: ShaderParams) -> Self
    where
        T: Into<String>,
    {
        self.decls.push((name.into(), ResourceDecl::Shader(params)));
        self
    }

    /// Declares a named render target.
    pub fn target<T>(mut self, name: T, params: TargetParams) -> Self
    where
        T: Into<String>,
    {
        self.decls.push((name.into(), ResourceDecl::Target(params)));
        self
    }

    pub fn finish(self) -> Arc<Registry> {
        Arc::new(Registry {
            constants: self.constants,
            decls: self.decls,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn constant_lookup() {
        let registry = Registry::build()
            .constant("fExposure", ConstantVariable::Float(1.0))
            .finish();

        assert_eq!(registry.constants_len(), 1);
        assert!(registry.constant("fExposure").is_some());
        assert!(registry.constant("fGamma").is_none());

        let c = registry.constant("fExposure").unwrap();
        assert_eq!(c.name(), "fExposure");
    }

    #[test]
    fn first_registration_wins() {
        let registry = Registry::build()
            .constant("fExposure", ConstantVariable::Float(1.0))
            .constant("fExposure", ConstantVariable::Float(2.0))
            .finish();

        assert_eq!(registry.constants_len(), 1);
        match registry.constant("fExposure").unwrap().get() {
            ConstantVariable::Float(v) => assert_eq!(v, 1.0),
            v => panic!("unexpected value {:?}", v),
        }
    }

    #[test]
    fn declarations_keep_order() {
        let registry = Registry::build()
            .texture("albedo", TextureParams::default())
            .target("half-res", TargetParams::default())
            .finish();

        let names: Vec<_> = registry.decls().iter().map(|v| v.0.as_str()).collect();
        assert_eq!(names, vec!["albedo", "half-res"]);
    }
}
