use std::path::{Path, PathBuf};

use crate::{
    error::{VisframeError, VisframeResult},
    frame::Frame,
    headers::{StreamHeaders, StreamMode},
};

/// Extension points a concrete on-disk format implements.
///
/// The state machine in [`Stream`] owns all header bookkeeping and legality
/// checks; a format only ever sees raw-byte mechanics. `seek_frame` receives
/// the already-validated absolute target index, so a format never has to
/// reason about bounds or relative deltas.
pub trait StreamFormat {
    /// Open an existing file for reading and populate `headers` (shape,
    /// frame count, physical scale, sample rate) from its header region.
    ///
    /// On any failure the implementation must release the handle before
    /// returning; the stream stays closed.
    fn open_for_read(&mut self, path: &Path, headers: &mut StreamHeaders) -> VisframeResult<()>;

    /// Create a new file and persist the current header snapshot.
    fn open_for_write(&mut self, path: &Path, headers: &StreamHeaders) -> VisframeResult<()>;

    /// Read one frame at the current file position.
    fn read_frame(&mut self, headers: &StreamHeaders) -> VisframeResult<Frame>;

    /// Append one frame at the current file position.
    fn write_frame(&mut self, headers: &StreamHeaders, frame: &Frame) -> VisframeResult<()>;

    /// Position the file at the start of frame `target`.
    fn seek_frame(&mut self, headers: &StreamHeaders, target: u32) -> VisframeResult<()>;

    /// Release the handle of a stream opened for reading.
    fn close_read(&mut self) -> VisframeResult<()>;

    /// Finalize a stream opened for writing (rewrite the true frame count),
    /// then release the handle. The handle must be released even when the
    /// rewrite fails.
    fn close_write(&mut self, frames_written: u32) -> VisframeResult<()>;
}

/// Sequential/random-access session over a file holding a header plus an
/// ordered sequence of fixed-shape frames.
///
/// Lifecycle: construct with a path and a header snapshot, `open`, then
/// `read`/`write`/`move_by`/`first`/`last`, then `close`. Every operation is
/// checked against the session mode and state before any I/O happens. Any
/// error raised by the format while the stream is opened is fatal to the
/// session: the handle is force-closed (best effort) before the error
/// propagates.
pub struct Stream<F: StreamFormat> {
    path: PathBuf,
    headers: StreamHeaders,
    format: F,
}

impl<F: StreamFormat> Stream<F> {
    pub fn with_format(path: impl Into<PathBuf>, headers: StreamHeaders, format: F) -> Self {
        Self {
            path: path.into(),
            headers,
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &StreamHeaders {
        &self.headers
    }

    /// Mutable access to the header record, for pre-setting fields before
    /// `open`.
    pub fn headers_mut(&mut self) -> &mut StreamHeaders {
        &mut self.headers
    }

    /// Open the session. A no-op when the stream is already opened.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub fn open(&mut self) -> VisframeResult<()> {
        if self.headers.is_opened() {
            return Ok(());
        }
        match self.headers.mode() {
            StreamMode::Read => {
                self.format.open_for_read(&self.path, &mut self.headers)?;
            }
            StreamMode::Write => {
                // Checked before any file is created, so an existing file is
                // never truncated.
                if self.path.exists() {
                    return Err(VisframeError::file_exists(self.path.display().to_string()));
                }
                self.format.open_for_write(&self.path, &self.headers)?;
            }
        }
        self.headers.set_opened(true);
        self.headers.set_current_frame(0);
        Ok(())
    }

    /// Close the session. Idempotent: closing a closed stream does nothing.
    ///
    /// The header record never reports `opened` after this returns, even
    /// when the format's close mechanics fail.
    pub fn close(&mut self) -> VisframeResult<()> {
        if !self.headers.is_opened() {
            return Ok(());
        }
        let result = match self.headers.mode() {
            StreamMode::Read => self.format.close_read(),
            StreamMode::Write => self.format.close_write(self.headers.current_frame()),
        };
        self.headers.set_opened(false);
        tracing::debug!(path = %self.path.display(), "stream closed");
        result
    }

    /// Read the frame at `current_frame` and advance by one.
    ///
    /// Reading at exhaustion (`current_frame == nframes`) closes the stream
    /// and raises `EndOfStream`.
    pub fn read(&mut self) -> VisframeResult<Frame> {
        self.ensure_session(StreamMode::Read, "read")?;
        if self.headers.current_frame() >= self.headers.nframes {
            let err = VisframeError::end_of_stream(format!(
                "all {} frames consumed",
                self.headers.nframes
            ));
            return Err(self.fail_session(err));
        }
        match self.format.read_frame(&self.headers) {
            Ok(frame) => {
                self.headers
                    .set_current_frame(self.headers.current_frame() + 1);
                Ok(frame)
            }
            Err(err) => Err(self.fail_session(err)),
        }
    }

    /// Write one frame and advance by one.
    ///
    /// A shape mismatch is rejected before any byte is written and leaves
    /// the session intact.
    pub fn write(&mut self, frame: &Frame) -> VisframeResult<()> {
        self.ensure_session(StreamMode::Write, "write")?;
        if frame.shape() != (self.headers.height, self.headers.width) {
            return Err(VisframeError::shape_mismatch(format!(
                "expected {}x{}, got {}x{}",
                self.headers.height,
                self.headers.width,
                frame.height(),
                frame.width()
            )));
        }
        match self.format.write_frame(&self.headers, frame) {
            Ok(()) => {
                self.headers
                    .set_current_frame(self.headers.current_frame() + 1);
                Ok(())
            }
            Err(err) => Err(self.fail_session(err)),
        }
    }

    /// Seek by `delta` frames relative to `current_frame`.
    ///
    /// The target is validated against `[0, nframes - 1]` before the format
    /// is touched; a rejected move leaves the file position and the session
    /// exactly as they were.
    pub fn move_by(&mut self, delta: i64) -> VisframeResult<()> {
        self.ensure_session(StreamMode::Read, "move")?;
        let target = i64::from(self.headers.current_frame()) + delta;
        if target < 0 || target >= i64::from(self.headers.nframes) {
            return Err(VisframeError::end_of_stream(format!(
                "move by {delta} targets frame {target}, valid range is 0..{}",
                self.headers.nframes
            )));
        }
        self.seek_validated(target as u32)
    }

    /// Seek to frame 0.
    pub fn first(&mut self) -> VisframeResult<()> {
        self.ensure_session(StreamMode::Read, "first")?;
        self.seek_validated(0)
    }

    /// Seek to the final frame, so the next `read` returns it.
    pub fn last(&mut self) -> VisframeResult<()> {
        self.ensure_session(StreamMode::Read, "last")?;
        if self.headers.nframes == 0 {
            return Err(VisframeError::end_of_stream("stream holds no frames"));
        }
        self.seek_validated(self.headers.nframes - 1)
    }

    fn seek_validated(&mut self, target: u32) -> VisframeResult<()> {
        match self.format.seek_frame(&self.headers, target) {
            Ok(()) => {
                self.headers.set_current_frame(target);
                Ok(())
            }
            Err(err) => Err(self.fail_session(err)),
        }
    }

    fn ensure_session(&self, mode: StreamMode, op: &str) -> VisframeResult<()> {
        if !self.headers.is_opened() {
            return Err(VisframeError::wrong_mode(format!(
                "{op} called on a closed stream"
            )));
        }
        if self.headers.mode() != mode {
            return Err(VisframeError::wrong_mode(format!(
                "{op} called on a {:?}-mode stream",
                self.headers.mode()
            )));
        }
        Ok(())
    }

    /// Force the session closed after a fatal error, keeping the original
    /// error. A failure of the forced close itself is logged, never returned.
    fn fail_session(&mut self, err: VisframeError) -> VisframeError {
        if let Err(close_err) = self.close() {
            tracing::warn!(
                path = %self.path.display(),
                error = %close_err,
                "forced close after stream error also failed"
            );
        }
        err
    }
}
