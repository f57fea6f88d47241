pub type VisframeResult<T> = Result<T, VisframeError>;

#[derive(thiserror::Error, Debug)]
pub enum VisframeError {
    #[error("bad magic: {0}")]
    BadMagic(String),

    #[error("file already exists: {0}")]
    FileExists(String),

    #[error("wrong stream mode or state: {0}")]
    WrongMode(String),

    #[error("end of stream reached: {0}")]
    EndOfStream(String),

    #[error("frame shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid physical scale: {0}")]
    InvalidScale(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VisframeError {
    pub fn bad_magic(msg: impl Into<String>) -> Self {
        Self::BadMagic(msg.into())
    }

    pub fn file_exists(msg: impl Into<String>) -> Self {
        Self::FileExists(msg.into())
    }

    pub fn wrong_mode(msg: impl Into<String>) -> Self {
        Self::WrongMode(msg.into())
    }

    pub fn end_of_stream(msg: impl Into<String>) -> Self {
        Self::EndOfStream(msg.into())
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn invalid_scale(msg: impl Into<String>) -> Self {
        Self::InvalidScale(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
