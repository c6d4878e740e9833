use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{EvolvotronError, EvolvotronResult};
use crate::foundation::random::Random01;
use crate::image::Image;

/// Highest progressive level requested; displays up to 4096 pixels on a side.
pub const MAX_LEVEL: u32 = 12;

/// Largest sub-sample grid side; 16 gives 256 samples per pixel.
pub const MAX_MULTISAMPLE: u32 = 16;

/// Identifies the display a task renders for. Used for cancellation and delivery routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayId(pub u64);

/// Per-pixel sampling options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOpts {
    /// Sub-samples per pixel side; `n` gives `n * n` samples per pixel.
    pub multisample: u32,
    /// Randomly place each sub-sample within its sub-cell instead of at its centre.
    pub jitter: bool,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            multisample: 1,
            jitter: false,
        }
    }
}

impl RenderOpts {
    pub fn validate(&self) -> EvolvotronResult<()> {
        if !(1..=MAX_MULTISAMPLE).contains(&self.multisample) {
            return Err(EvolvotronError::validation(format!(
                "render 'multisample' must be in 1..={MAX_MULTISAMPLE}, got {}",
                self.multisample
            )));
        }
        Ok(())
    }
}

/// Shared cancellation flag for one task, held by whoever created the task.
#[derive(Clone, Debug, Default)]
pub struct TaskAbort(Arc<AtomicBool>);

impl TaskAbort {
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Where rendering resumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: u32,
    pub col: u32,
    pub frame: u32,
}

/// One unit of farm work: evaluate an image over a `width * height * frames` pixel grid.
///
/// Progress lives in the task, so a deferred task resumes where it stopped.
#[derive(Debug)]
pub struct RenderTask {
    image: Arc<Image>,
    display: DisplayId,
    width: u32,
    height: u32,
    frames: u32,
    level: u32,
    serial: u64,
    opts: RenderOpts,
    cursor: Cursor,
    pixel: usize,
    completed: bool,
    finished: Option<u64>,
    abort: TaskAbort,
    jitter: Random01,
    buffer: Vec<u32>,
}

impl RenderTask {
    /// A new task. Zero dimensions are raised to 1.
    pub fn new(
        image: Arc<Image>,
        display: DisplayId,
        (width, height): (u32, u32),
        frames: u32,
        level: u32,
        serial: u64,
        opts: RenderOpts,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let frames = frames.max(1);
        let len = width as usize * height as usize * frames as usize;
        let seed = image.serial() ^ (u64::from(level) << 48) ^ display.0.rotate_left(24);
        Self {
            image,
            display,
            width,
            height,
            frames,
            level,
            serial,
            opts: RenderOpts {
                multisample: opts.multisample.clamp(1, MAX_MULTISAMPLE),
                ..opts
            },
            cursor: Cursor::default(),
            pixel: 0,
            completed: false,
            finished: None,
            abort: TaskAbort::default(),
            jitter: Random01::new(seed),
            buffer: vec![0; len],
        }
    }

    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }

    pub fn display(&self) -> DisplayId {
        self.display
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Resolution tier; 0 is full resolution, each step halves both sides.
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn opts(&self) -> RenderOpts {
        self.opts
    }

    /// Pixel count of one frame. Smaller values are scheduled first.
    pub fn priority(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Pixels rendered so far, across all frames.
    pub fn pixels_done(&self) -> usize {
        self.pixel
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Position in the farm's completion sequence, once the task has left the workers.
    pub fn finish_order(&self) -> Option<u64> {
        self.finished
    }

    pub(crate) fn mark_finished(&mut self, order: u64) {
        self.finished = Some(order);
    }

    pub fn abort_handle(&self) -> TaskAbort {
        self.abort.clone()
    }

    pub fn abort(&self) {
        self.abort.abort();
    }

    pub fn aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    /// Packed `0xRRGGBB` pixels, frame after frame, rows top to bottom.
    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    /// Pixels of frame `f`, or `None` past the last frame.
    pub fn frame(&self, f: u32) -> Option<&[u32]> {
        let n = self.width as usize * self.height as usize;
        let start = (f as usize).checked_mul(n)?;
        self.buffer.get(start..start.checked_add(n)?)
    }

    pub fn into_buffer(self) -> Vec<u32> {
        self.buffer
    }

    /// Render pixels from the cursor until finished or until `stop` says otherwise.
    ///
    /// `stop` is consulted before every pixel. Returns true once the task is complete.
    pub fn render(&mut self, mut stop: impl FnMut() -> bool) -> bool {
        let n = self.opts.multisample as usize;
        let mut offsets = Vec::with_capacity(n.saturating_mul(n));
        while !self.completed {
            if stop() {
                return false;
            }
            self.sub_pixel_offsets(&mut offsets);
            let Cursor { row, col, frame } = self.cursor;
            self.buffer[self.pixel] = self.image.pixel(
                col,
                row,
                frame,
                self.width,
                self.height,
                self.frames,
                &offsets,
            );
            self.advance();
        }
        true
    }

    fn sub_pixel_offsets(&mut self, out: &mut Vec<(f64, f64)>) {
        out.clear();
        let n = self.opts.multisample;
        let step = 1.0 / f64::from(n);
        for sy in 0..n {
            for sx in 0..n {
                let (jx, jy) = if self.opts.jitter {
                    (self.jitter.r01(), self.jitter.r01())
                } else {
                    (0.5, 0.5)
                };
                out.push(((f64::from(sx) + jx) * step, (f64::from(sy) + jy) * step));
            }
        }
    }

    fn advance(&mut self) {
        self.pixel += 1;
        self.cursor.col += 1;
        if self.cursor.col == self.width {
            self.cursor.col = 0;
            self.cursor.row += 1;
            if self.cursor.row == self.height {
                self.cursor.row = 0;
                self.cursor.frame += 1;
                if self.cursor.frame == self.frames {
                    self.completed = true;
                }
            }
        }
    }
}

/// The multi-resolution ladder a display requests for one image.
///
/// One task per level `L` in `MAX_LEVEL..=0` (coarsest first) whose scale `2^L` fits inside
/// both sides of `size`; the level `L` task renders `size / 2^L`.
pub fn progressive_tasks(
    image: &Arc<Image>,
    display: DisplayId,
    (width, height): (u32, u32),
    frames: u32,
    serial: u64,
    opts: RenderOpts,
) -> Vec<RenderTask> {
    (0..=MAX_LEVEL)
        .rev()
        .filter(|&level| {
            let s = 1u32 << level;
            width >= s && height >= s
        })
        .map(|level| {
            RenderTask::new(
                Arc::clone(image),
                display,
                (width >> level, height >> level),
                frames,
                level,
                serial,
                opts,
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/task.rs"]
mod tests;
