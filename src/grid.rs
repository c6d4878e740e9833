use crate::foundation::error::{EvolvotronError, EvolvotronResult};

/// Layout of a batch of images: a `cols * rows` grid of square cells, each an animation of
/// `frames` frames played at `fps`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GridOpts {
    pub cols: u32,
    pub rows: u32,
    /// Cell side in pixels.
    pub cell_size: u32,
    pub frames: u32,
    pub fps: u32,
}

impl Default for GridOpts {
    fn default() -> Self {
        Self {
            cols: 6,
            rows: 5,
            cell_size: 128,
            frames: 1,
            fps: 8,
        }
    }
}

impl GridOpts {
    pub fn validate(&self) -> EvolvotronResult<()> {
        if u64::from(self.cols) * u64::from(self.rows) < 2 {
            return Err(EvolvotronError::validation(format!(
                "grid must have at least 2 cells, got {}x{}",
                self.cols, self.rows
            )));
        }
        if self.cell_size == 0 {
            return Err(EvolvotronError::validation("grid 'cell_size' must be >= 1"));
        }
        if self.frames == 0 {
            return Err(EvolvotronError::validation("grid 'frames' must be >= 1"));
        }
        if self.fps == 0 {
            return Err(EvolvotronError::validation("grid 'fps' must be >= 1"));
        }
        Ok(())
    }

    pub fn cells(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// `(col, row)` of cell `index`, row-major.
    pub fn position(&self, index: usize) -> (u32, u32) {
        let cols = self.cols.max(1) as usize;
        ((index % cols) as u32, (index / cols) as u32)
    }
}

/// Unpack `0xRRGGBB` pixels into interleaved 8-bit RGB.
pub fn rgb8(pixels: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * 3);
    for &p in pixels {
        out.extend_from_slice(&[(p >> 16) as u8, (p >> 8) as u8, p as u8]);
    }
    out
}
