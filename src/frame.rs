use crate::error::{VisframeError, VisframeResult};

/// One fixed-shape 2-D matrix of doubles, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    height: u32,
    width: u32,
    data: Vec<f64>,
}

impl Frame {
    /// Create a zero-filled frame with the given shape.
    pub fn new(height: u32, width: u32) -> VisframeResult<Self> {
        if height == 0 || width == 0 {
            return Err(VisframeError::validation(
                "frame height and width must be > 0",
            ));
        }
        Ok(Self {
            height,
            width,
            data: vec![0.0; height as usize * width as usize],
        })
    }

    /// Create a frame from a row-major buffer of `height * width` values.
    pub fn from_vec(height: u32, width: u32, data: Vec<f64>) -> VisframeResult<Self> {
        if height == 0 || width == 0 {
            return Err(VisframeError::validation(
                "frame height and width must be > 0",
            ));
        }
        let expected = height as usize * width as usize;
        if data.len() != expected {
            return Err(VisframeError::validation(format!(
                "frame buffer has {} values, shape {height}x{width} needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Create a frame from rows of equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> VisframeResult<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        if height == 0 || width == 0 {
            return Err(VisframeError::validation(
                "frame needs at least one row and one column",
            ));
        }
        let mut data = Vec::with_capacity(height as usize * width as usize);
        for (i, row) in rows.iter().enumerate() {
            if row.len() as u32 != width {
                return Err(VisframeError::validation(format!(
                    "row {i} has {} values, expected {width}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// `(height, width)` pair.
    pub fn shape(&self) -> (u32, u32) {
        (self.height, self.width)
    }

    pub fn get(&self, row: u32, col: u32) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.data[row as usize * self.width as usize + col as usize])
    }

    pub fn set(&mut self, row: u32, col: u32, value: f64) -> VisframeResult<()> {
        if row >= self.height || col >= self.width {
            return Err(VisframeError::validation(format!(
                "index ({row}, {col}) out of bounds for shape {}x{}",
                self.height, self.width
            )));
        }
        self.data[row as usize * self.width as usize + col as usize] = value;
        Ok(())
    }

    /// Row-major view of the whole frame.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
