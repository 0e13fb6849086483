//! Output streams and external re-encoding.
//!
//! Sinks consume frames in arrival order and are driven by `VideoSession`.

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
/// Bitrate-targeted compression through an external transcoder.
pub mod transcode;
