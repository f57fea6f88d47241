use std::{
    fs::{File, OpenOptions},
    io::{Seek, SeekFrom, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    error::{VisframeError, VisframeResult},
    frame::Frame,
    headers::StreamHeaders,
    stream::{Stream, StreamFormat},
    wire,
};

/// Marker at the head of every native stream file.
pub const STREAM_MAGIC: &str = "#!vis-brain.data.stream";

/// Byte offset of the stored frame count inside the header region.
const NFRAMES_OFFSET: u64 = 264;

/// Byte offset of frame 0: 256-byte magic block + 3 i32 + 3 f64.
const FRAMES_OFFSET: u64 = 292;

/// Native binary stream layout:
///
/// ```text
/// [0, 256)    NUL-padded magic "#!vis-brain.data.stream"
/// [256, 268)  i32 height, i32 width, i32 nframes   (native endian)
/// [268, 292)  f64 height_um, f64 width_um, f64 sample_rate
/// [292, ..)   frames of height*width f64, row-major
/// ```
///
/// The frame count at offset 264 doubles as the footer: a writer rewrites it
/// with the number of frames actually produced when the stream closes, so a
/// run that stops early still leaves a self-consistent file behind.
#[derive(Default)]
pub struct BinFormat {
    file: Option<File>,
    scratch: Vec<u8>,
}

/// A [`Stream`] over the native binary layout.
pub type BinStream = Stream<BinFormat>;

impl BinStream {
    pub fn new(path: impl Into<PathBuf>, headers: StreamHeaders) -> Self {
        Stream::with_format(path, headers, BinFormat::default())
    }
}

impl BinFormat {
    fn handle(&mut self) -> VisframeResult<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| VisframeError::wrong_mode("stream file handle is not open"))
    }

    fn read_header_region(&mut self, path: &Path, headers: &mut StreamHeaders) -> VisframeResult<()> {
        let file = self.handle()?;

        let block = wire::read_magic_block(file)
            .with_context(|| format!("failed to read magic from '{}'", path.display()))?;
        if !wire::matches_magic(&block, STREAM_MAGIC) {
            return Err(VisframeError::bad_magic(format!(
                "'{}' is not a vis-brain stream file",
                path.display()
            )));
        }

        let read_header_err =
            |field: &str| format!("failed to read header field '{field}' from '{}'", path.display());
        let height = wire::read_i32(file).with_context(|| read_header_err("height"))?;
        let width = wire::read_i32(file).with_context(|| read_header_err("width"))?;
        let nframes = wire::read_i32(file).with_context(|| read_header_err("nframes"))?;
        if height <= 0 || width <= 0 || nframes < 0 {
            return Err(VisframeError::validation(format!(
                "corrupt stream header in '{}': height={height}, width={width}, nframes={nframes}",
                path.display()
            )));
        }
        // A positive shape can still describe a frame no allocation could
        // hold; reject it here so a corrupt header surfaces as an error on
        // open instead of an aborted read.
        let frame_bytes = (height as u64 * width as u64).checked_mul(8);
        if frame_bytes.is_none_or(|bytes| bytes > usize::MAX as u64) {
            return Err(VisframeError::validation(format!(
                "frame shape {height}x{width} in '{}' is too large to read",
                path.display()
            )));
        }
        let height_um = wire::read_f64(file).with_context(|| read_header_err("height_um"))?;
        let width_um = wire::read_f64(file).with_context(|| read_header_err("width_um"))?;
        let sample_rate = wire::read_f64(file).with_context(|| read_header_err("sample_rate"))?;

        headers.height = height as u32;
        headers.width = width as u32;
        // The stored count is authoritative; the file is never rescanned.
        headers.nframes = nframes as u32;
        headers.sample_rate = sample_rate;
        headers.set_scale_unchecked(height_um, width_um);
        Ok(())
    }

    /// Convert the header fields stored as 4-byte signed integers on disk,
    /// rejecting values the format cannot represent.
    fn header_ints(headers: &StreamHeaders) -> VisframeResult<(i32, i32, i32)> {
        let checked = |name: &str, value: u32| {
            i32::try_from(value).map_err(|_| {
                VisframeError::validation(format!(
                    "{name} {value} exceeds the native format limit of {}",
                    i32::MAX
                ))
            })
        };
        Ok((
            checked("height", headers.height)?,
            checked("width", headers.width)?,
            checked("nframes", headers.nframes)?,
        ))
    }

    fn write_header_region(
        &mut self,
        path: &Path,
        headers: &StreamHeaders,
        ints: (i32, i32, i32),
    ) -> VisframeResult<()> {
        let (height, width, nframes) = ints;
        let height_um = headers.height_um();
        let width_um = headers.width_um();
        let file = self.handle()?;

        file.write_all(&wire::magic_block(STREAM_MAGIC))
            .with_context(|| format!("failed to write magic to '{}'", path.display()))?;
        let write_header_err =
            || format!("failed to write stream header to '{}'", path.display());
        wire::write_i32(file, height).with_context(write_header_err)?;
        wire::write_i32(file, width).with_context(write_header_err)?;
        wire::write_i32(file, nframes).with_context(write_header_err)?;
        wire::write_f64(file, height_um).with_context(write_header_err)?;
        wire::write_f64(file, width_um).with_context(write_header_err)?;
        wire::write_f64(file, headers.sample_rate).with_context(write_header_err)?;
        Ok(())
    }
}

impl StreamFormat for BinFormat {
    fn open_for_read(&mut self, path: &Path, headers: &mut StreamHeaders) -> VisframeResult<()> {
        let file = File::open(path)
            .with_context(|| format!("failed to open stream file '{}'", path.display()))?;
        self.file = Some(file);
        let result = self.read_header_region(path, headers);
        if result.is_err() {
            // Handle must be released before the error leaves the format.
            self.file = None;
        }
        result
    }

    fn open_for_write(&mut self, path: &Path, headers: &StreamHeaders) -> VisframeResult<()> {
        // Validated before the file is created, so a rejected header never
        // leaves an empty file behind.
        let ints = Self::header_ints(headers)?;
        let file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(VisframeError::file_exists(path.display().to_string()));
            }
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("failed to create stream file '{}'", path.display()))
                    .into());
            }
        };
        self.file = Some(file);
        let result = self.write_header_region(path, headers, ints);
        if result.is_err() {
            self.file = None;
        }
        result
    }

    fn read_frame(&mut self, headers: &StreamHeaders) -> VisframeResult<Frame> {
        let count = headers.frame_len();
        let (height, width) = (headers.height, headers.width);
        let file = self.handle()?;
        let data = wire::read_doubles(file, count)
            .with_context(|| format!("failed to read frame {}", headers.current_frame()))?;
        Frame::from_vec(height, width, data)
    }

    fn write_frame(&mut self, headers: &StreamHeaders, frame: &Frame) -> VisframeResult<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        let index = headers.current_frame();
        let file = self.handle()?;
        let result = wire::write_doubles(file, frame.as_slice(), &mut scratch)
            .with_context(|| format!("failed to write frame {index}"));
        self.scratch = scratch;
        result?;
        Ok(())
    }

    fn seek_frame(&mut self, headers: &StreamHeaders, target: u32) -> VisframeResult<()> {
        // The offset is derived from the validated target index, never from
        // a raw relative delta, so a rejected seek can never drift the
        // position.
        let offset = (headers.frame_len() as u64)
            .checked_mul(8)
            .and_then(|bytes| bytes.checked_mul(u64::from(target)))
            .and_then(|bytes| bytes.checked_add(FRAMES_OFFSET))
            .ok_or_else(|| {
                VisframeError::validation(format!("byte offset of frame {target} overflows"))
            })?;
        let file = self.handle()?;
        file.seek(SeekFrom::Start(offset))
            .with_context(|| format!("failed to seek to frame {target}"))?;
        Ok(())
    }

    fn close_read(&mut self) -> VisframeResult<()> {
        self.file = None;
        Ok(())
    }

    fn close_write(&mut self, frames_written: u32) -> VisframeResult<()> {
        let count = i32::try_from(frames_written).map_err(|_| {
            VisframeError::validation(format!(
                "frame count {frames_written} exceeds the native format limit of {}",
                i32::MAX
            ))
        });
        let result = match (self.handle(), count) {
            (Ok(file), Ok(count)) => file
                .seek(SeekFrom::Start(NFRAMES_OFFSET))
                .and_then(|_| file.write_all(&count.to_ne_bytes()))
                .context("failed to rewrite frame count on close")
                .map_err(VisframeError::from),
            (Err(err), _) | (_, Err(err)) => Err(err),
        };
        // Release the handle even when the footer rewrite failed.
        self.file = None;
        result
    }
}
