use std::path::PathBuf;

use crate::foundation::core::{Fps, Resolution};
use crate::foundation::human::{format_duration, format_size};

/// Summary of a finished export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportReport {
    /// Path the video was written to.
    pub output_path: PathBuf,
    /// Container/codec description from the sink.
    pub format: String,
    /// Final width and height.
    pub resolution: Resolution,
    /// Final frame rate, derived or fixed.
    pub fps: Fps,
    pub frame_count: u64,
    /// Playback duration, `frame_count / fps`.
    pub duration_secs: f64,
    /// Size of the output file; 0 when the sink wrote no file.
    pub file_size_bytes: u64,
}

impl std::fmt::Display for ExportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "exported:    {}", self.output_path.display())?;
        writeln!(f, "format:      {}", self.format)?;
        writeln!(f, "resolution:  {}", self.resolution)?;
        writeln!(f, "fps:         {}", self.fps)?;
        writeln!(f, "frames:      {}", self.frame_count)?;
        writeln!(f, "duration:    {}", format_duration(self.duration_secs))?;
        write!(f, "size:        {}", format_size(self.file_size_bytes))
    }
}

/// Progress of deferred assembly, reported once per frame written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportProgress {
    /// Frames written so far.
    pub done: u64,
    /// Frames to write in total.
    pub total: u64,
}

impl ExportProgress {
    /// Completion in `[0, 1]`; an empty export counts as complete.
    pub fn fraction(self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

/// Callback receiving [`ExportProgress`] updates.
pub type ProgressCallback = Box<dyn FnMut(ExportProgress) + Send>;
