#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{} is invalid.", _0)]
    HandleInvalid(String),
    #[fail(display = "'{}' is not initialized.", _0)]
    NotInitialized(String),
    #[fail(display = "Texture is invalid: {}", _0)]
    TextureInvalid(String),
    #[fail(display = "Shader is invalid: {}", _0)]
    ShaderInvalid(String),
    #[fail(display = "Render target is invalid: {}", _0)]
    TargetInvalid(String),
    #[fail(
        display = "Too many color attachments ({} declared, device limit is {}).",
        _0, _1
    )]
    TooManyColorAttachments(usize, usize),
    #[fail(display = "Failed to compile shader program, errors:\n{}", _0)]
    ShaderCreationFailure(String),
    #[fail(display = "Device: {}", _0)]
    Device(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;
