use crate::error::{VisframeError, VisframeResult};

/// Direction of a stream session. Fixed for the life of the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StreamMode {
    Read,
    Write,
}

/// Mutable metadata record scoped to one stream session.
///
/// Callers pre-set the public fields (and the physical scale through the
/// validated setters) before `open`; after that the state machine owns
/// `current_frame` and `opened`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StreamHeaders {
    /// Frame height in elements, fixed for the whole stream.
    pub height: u32,
    /// Frame width in elements, fixed for the whole stream.
    pub width: u32,
    /// Total frame count. Authoritative while reading, advisory while
    /// writing (corrected from frames actually written on close).
    pub nframes: u32,
    /// Frames per unit time. Consumer-only; never interpreted by the core.
    pub sample_rate: f64,
    height_um: f64,
    width_um: f64,
    mode: StreamMode,
    current_frame: u32,
    opened: bool,
}

impl Default for StreamHeaders {
    fn default() -> Self {
        Self {
            height: 512,
            width: 512,
            nframes: 40,
            sample_rate: 1.0,
            height_um: 12000.0,
            width_um: 12000.0,
            mode: StreamMode::Write,
            current_frame: 0,
            opened: false,
        }
    }
}

impl StreamHeaders {
    /// Default headers with the given mode.
    pub fn new(mode: StreamMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// 0-based count of frames consumed/produced so far.
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Physical height of one frame in micrometers.
    pub fn height_um(&self) -> f64 {
        self.height_um
    }

    /// Physical width of one frame in micrometers.
    pub fn width_um(&self) -> f64 {
        self.width_um
    }

    pub fn set_height_um(&mut self, value: f64) -> VisframeResult<()> {
        if value <= 0.0 {
            return Err(VisframeError::invalid_scale(format!(
                "height_um must be > 0, got {value}"
            )));
        }
        self.height_um = value;
        Ok(())
    }

    pub fn set_width_um(&mut self, value: f64) -> VisframeResult<()> {
        if value <= 0.0 {
            return Err(VisframeError::invalid_scale(format!(
                "width_um must be > 0, got {value}"
            )));
        }
        self.width_um = value;
        Ok(())
    }

    /// Number of elements in one frame.
    pub fn frame_len(&self) -> usize {
        self.height as usize * self.width as usize
    }

    pub(crate) fn set_opened(&mut self, opened: bool) {
        self.opened = opened;
    }

    pub(crate) fn set_current_frame(&mut self, frame: u32) {
        self.current_frame = frame;
    }

    pub(crate) fn set_scale_unchecked(&mut self, height_um: f64, width_um: f64) {
        self.height_um = height_um;
        self.width_um = width_um;
    }
}
