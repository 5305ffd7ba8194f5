//! Shader parameters and the named constants that feed compiled programs
//! at draw time.

use std::sync::RwLock;

use crate::render::errors::{Error, Result};
use crate::utils::prelude::HashValue;

use super::texture::TextureHandle;

impl_handle!(ShaderHandle);

/// The parameters of a shader object: the paired vertex/pixel program
/// sources, compiled when the shader initializes. Recompilation (hot
/// reload) rebuilds the constant bindings from scratch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShaderParams {
    pub vs: String,
    pub ps: String,
}

impl ShaderParams {
    pub fn validate(&self) -> Result<()> {
        if self.vs.is_empty() {
            return Err(Error::ShaderInvalid(
                "Vertex program is required to describe a proper pipeline.".into(),
            ));
        }

        if self.ps.is_empty() {
            return Err(Error::ShaderInvalid(
                "Pixel program is required to describe a proper pipeline.".into(),
            ));
        }

        Ok(())
    }
}

/// Value kinds a reflected shader input can have. `Bool`, `Int` and
/// `Float` address the three constant register banks; `Sampler` addresses
/// a texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstantKind {
    Bool,
    Int,
    Float,
    Sampler,
}

/// The current value of a named shader constant.
///
/// Matrices are row-major; each row occupies one 4-component register,
/// whatever its column count. Array variants feed reflected inputs with an
/// array length greater than one.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantVariable {
    Bool(bool),
    BoolArray(Vec<bool>),
    Int(i32),
    Vector2i([i32; 2]),
    Vector3i([i32; 3]),
    Vector4i([i32; 4]),
    IntArray(Vec<i32>),
    Float(f32),
    Vector2f([f32; 2]),
    Vector3f([f32; 3]),
    Vector4f([f32; 4]),
    Matrix2f([[f32; 2]; 2]),
    Matrix3f([[f32; 3]; 3]),
    Matrix4f([[f32; 4]; 4]),
    FloatArray(Vec<f32>),
    Vector4fArray(Vec<[f32; 4]>),
    Matrix4fArray(Vec<[[f32; 4]; 4]>),
    Texture(TextureHandle),
}

impl ConstantVariable {
    pub fn kind(&self) -> ConstantKind {
        match *self {
            ConstantVariable::Bool(_) | ConstantVariable::BoolArray(_) => ConstantKind::Bool,
            ConstantVariable::Int(_)
            | ConstantVariable::Vector2i(_)
            | ConstantVariable::Vector3i(_)
            | ConstantVariable::Vector4i(_)
            | ConstantVariable::IntArray(_) => ConstantKind::Int,
            ConstantVariable::Float(_)
            | ConstantVariable::Vector2f(_)
            | ConstantVariable::Vector3f(_)
            | ConstantVariable::Vector4f(_)
            | ConstantVariable::Matrix2f(_)
            | ConstantVariable::Matrix3f(_)
            | ConstantVariable::Matrix4f(_)
            | ConstantVariable::FloatArray(_)
            | ConstantVariable::Vector4fArray(_)
            | ConstantVariable::Matrix4fArray(_) => ConstantKind::Float,
            ConstantVariable::Texture(_) => ConstantKind::Sampler,
        }
    }
}

impl Into<ConstantVariable> for bool {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Bool(self)
    }
}

impl Into<ConstantVariable> for i32 {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Int(self)
    }
}

impl Into<ConstantVariable> for f32 {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Float(self)
    }
}

impl Into<ConstantVariable> for Vec<bool> {
    fn into(self) -> ConstantVariable {
        ConstantVariable::BoolArray(self)
    }
}

impl Into<ConstantVariable> for [i32; 2] {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Vector2i(self)
    }
}

impl Into<ConstantVariable> for [i32; 3] {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Vector3i(self)
    }
}

impl Into<ConstantVariable> for [i32; 4] {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Vector4i(self)
    }
}

impl Into<ConstantVariable> for Vec<i32> {
    fn into(self) -> ConstantVariable {
        ConstantVariable::IntArray(self)
    }
}

impl Into<ConstantVariable> for Vec<f32> {
    fn into(self) -> ConstantVariable {
        ConstantVariable::FloatArray(self)
    }
}

impl Into<ConstantVariable> for [f32; 2] {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Vector2f(self)
    }
}

impl Into<ConstantVariable> for [f32; 3] {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Vector3f(self)
    }
}

impl Into<ConstantVariable> for [f32; 4] {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Vector4f(self)
    }
}

impl Into<ConstantVariable> for [[f32; 2]; 2] {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Matrix2f(self)
    }
}

impl Into<ConstantVariable> for [[f32; 3]; 3] {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Matrix3f(self)
    }
}

impl Into<ConstantVariable> for [[f32; 4]; 4] {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Matrix4f(self)
    }
}

impl Into<ConstantVariable> for Vec<[f32; 4]> {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Vector4fArray(self)
    }
}

impl Into<ConstantVariable> for TextureHandle {
    fn into(self) -> ConstantVariable {
        ConstantVariable::Texture(self)
    }
}

/// A named, typed value supplied from engine code into compiled programs
/// at draw time.
///
/// Constants are registered once, at startup, in the
/// [`Registry`](../../../res/registry/struct.Registry.html) and outlive
/// every shader; bindings reference them directly. The value cell may be
/// rewritten every frame.
#[derive(Debug)]
pub struct ShaderConstant {
    name: String,
    hash: HashValue<str>,
    value: RwLock<ConstantVariable>,
}

impl ShaderConstant {
    pub fn new<T>(name: T, initial: ConstantVariable) -> Self
    where
        T: Into<String>,
    {
        let name = name.into();
        let hash = HashValue::from(&name);

        ShaderConstant {
            name,
            hash,
            value: RwLock::new(initial),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn hash(&self) -> HashValue<str> {
        self.hash
    }

    /// Replaces the current value. The new value is picked up by the next
    /// dispatch of any shader bound to this constant.
    pub fn set<T>(&self, value: T)
    where
        T: Into<ConstantVariable>,
    {
        *self.value.write().unwrap() = value.into();
    }

    /// Reads the current value.
    pub fn get(&self) -> ConstantVariable {
        self.value.read().unwrap().clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validate() {
        let mut params = ShaderParams::default();
        assert!(params.validate().is_err());

        params.vs = "vs_main".into();
        params.ps = "ps_main".into();
        assert!(params.validate().is_ok());
    }

    #[test]
    fn constant_value_cell() {
        let c = ShaderConstant::new("fExposure", ConstantVariable::Float(1.0));
        assert_eq!(c.name(), "fExposure");
        assert_eq!(c.hash(), HashValue::from("fExposure"));
        assert_eq!(c.get(), ConstantVariable::Float(1.0));

        c.set(2.5f32);
        assert_eq!(c.get(), ConstantVariable::Float(2.5));
        assert_eq!(c.get().kind(), ConstantKind::Float);
    }
}
