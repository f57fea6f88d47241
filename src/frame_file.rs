use std::{fs::File, io::Write as _, path::Path};

use anyhow::Context as _;

use crate::{
    error::{VisframeError, VisframeResult},
    frame::Frame,
    wire,
};

/// Marker at the head of every single-frame file.
pub const FRAME_MAGIC: &str = "#!vis-brain.data.reader";

/// One matrix saved on its own, outside any stream: 256-byte NUL-padded
/// magic, `i32 width`, `i32 height` (note the order is reversed relative to
/// the stream header), `f64 width_um`, `f64 height_um`, then `width*height`
/// row-major doubles.
///
/// This is a stateless save/load pair. `save` always creates the file from
/// scratch; there is no position tracking and no frame counter.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameFile {
    pub frame: Frame,
    pub width_um: f64,
    pub height_um: f64,
}

impl FrameFile {
    pub fn load(path: impl AsRef<Path>) -> VisframeResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .with_context(|| format!("failed to open frame file '{}'", path.display()))?;

        let block = wire::read_magic_block(&mut file)
            .with_context(|| format!("failed to read magic from '{}'", path.display()))?;
        if !wire::matches_magic(&block, FRAME_MAGIC) {
            return Err(VisframeError::bad_magic(format!(
                "'{}' is not a vis-brain frame file",
                path.display()
            )));
        }

        let read_err = || format!("failed to read frame header from '{}'", path.display());
        let width = wire::read_i32(&mut file).with_context(read_err)?;
        let height = wire::read_i32(&mut file).with_context(read_err)?;
        if width <= 0 || height <= 0 {
            return Err(VisframeError::validation(format!(
                "corrupt frame header in '{}': width={width}, height={height}",
                path.display()
            )));
        }
        let width_um = wire::read_f64(&mut file).with_context(read_err)?;
        let height_um = wire::read_f64(&mut file).with_context(read_err)?;

        let count = width as u64 * height as u64;
        if count.checked_mul(8).is_none_or(|bytes| bytes > usize::MAX as u64) {
            return Err(VisframeError::validation(format!(
                "frame shape {height}x{width} in '{}' is too large to read",
                path.display()
            )));
        }
        let data = wire::read_doubles(&mut file, count as usize)
            .with_context(|| format!("failed to read frame payload from '{}'", path.display()))?;
        let frame = Frame::from_vec(height as u32, width as u32, data)?;
        Ok(Self {
            frame,
            width_um,
            height_um,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> VisframeResult<()> {
        let path = path.as_ref();
        let mut file = File::create(path)
            .with_context(|| format!("failed to create frame file '{}'", path.display()))?;

        let write_err = || format!("failed to write frame file '{}'", path.display());
        file.write_all(&wire::magic_block(FRAME_MAGIC))
            .with_context(write_err)?;
        wire::write_i32(&mut file, self.frame.width() as i32).with_context(write_err)?;
        wire::write_i32(&mut file, self.frame.height() as i32).with_context(write_err)?;
        wire::write_f64(&mut file, self.width_um).with_context(write_err)?;
        wire::write_f64(&mut file, self.height_um).with_context(write_err)?;
        let mut scratch = Vec::new();
        wire::write_doubles(&mut file, self.frame.as_slice(), &mut scratch)
            .with_context(write_err)?;
        Ok(())
    }
}
