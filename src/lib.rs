//! vidreel buffers frames produced by a render loop and assembles them into one video file.
//!
//! - Configure a [`SessionOpts`] (fixed or automatic frame rate and resolution)
//! - Create a [`VideoSession`] and feed it a [`Frame`] per tick
//! - [`export`](VideoSession::export) once at the end, optionally [`compress`](VideoSession::compress)
//!
//! Encoding is delegated to the system `ffmpeg`; staged frames use the `image` crate.
#![forbid(unsafe_code)]

mod foundation;

/// Frame buffers and staging.
pub mod frame;
/// Output sinks and transcoding.
pub mod encode;
/// Recording sessions.
pub mod session;

pub use crate::foundation::clock::{Clock, ManualClock, SystemClock};
pub use crate::foundation::core::{Fps, FrameIndex, MAX_RATE_DENOMINATOR, Resolution};
pub use crate::foundation::error::{VidreelError, VidreelResult};
pub use crate::foundation::human::{format_duration, format_size};

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::encode::transcode::{
    CompressOpts, CompressReport, FfmpegTranscoder, Transcoder, compress_file,
};
pub use crate::frame::buffer::{ChannelOrder, Frame};
pub use crate::frame::staging::StagingArea;
pub use crate::session::opts::{ExportMode, FrameRate, ResolutionSetting, SessionOpts};
pub use crate::session::report::{ExportProgress, ExportReport, ProgressCallback};
pub use crate::session::video_session::VideoSession;
