//! Session-oriented recording API.

/// Construction options and their validation.
pub mod opts;
/// Export and progress reports.
pub mod report;
/// The frame-buffering video session.
pub mod video_session;
