#![forbid(unsafe_code)]

pub mod bin_format;
pub mod error;
pub mod frame;
pub mod frame_file;
pub mod headers;
pub mod stream;
mod wire;

pub use bin_format::{BinFormat, BinStream, STREAM_MAGIC};
pub use error::{VisframeError, VisframeResult};
pub use frame::Frame;
pub use frame_file::{FRAME_MAGIC, FrameFile};
pub use headers::{StreamHeaders, StreamMode};
pub use stream::{Stream, StreamFormat};
