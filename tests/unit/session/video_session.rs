use super::*;
use crate::encode::sink::InMemorySink;
use crate::foundation::clock::ManualClock;
use image::RgbImage;

/// Sink that can be told to fail pushes or `end`, and remembers what was called.
#[derive(Default)]
struct FlakySink {
    fail_push: bool,
    fail_end: bool,
    began: bool,
    ended: bool,
    pushed: usize,
    output: Option<PathBuf>,
}

impl FrameSink for FlakySink {
    fn begin(&mut self, _cfg: SinkConfig) -> VidreelResult<()> {
        self.began = true;
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &RgbImage) -> VidreelResult<()> {
        if self.fail_push {
            return Err(VidreelError::io("disk full"));
        }
        self.pushed += 1;
        Ok(())
    }

    fn end(&mut self) -> VidreelResult<()> {
        self.ended = true;
        if self.fail_end {
            return Err(VidreelError::io("encoder crashed"));
        }
        Ok(())
    }

    fn format_name(&self) -> &str {
        "flaky"
    }

    fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

fn fixed_png() -> SessionOpts {
    deferred_png()
        .with_frame_rate(FrameRate::Fixed(10.0))
        .with_resolution(ResolutionSetting::Fixed(Resolution::new(4, 4)))
}

fn deferred_png() -> SessionOpts {
    SessionOpts::new("unused.mp4").with_staged_image_format("png")
}

#[test]
fn derive_frame_rate_rounds_to_hundredths() {
    let fps = derive_frame_rate(3, Duration::from_secs(2)).unwrap();
    assert_eq!(fps.as_f64(), 1.5);

    let fps = derive_frame_rate(100, Duration::from_secs(3)).unwrap();
    assert_eq!(fps.as_f64(), 33.33);
}

#[test]
fn derive_frame_rate_treats_zero_elapsed_as_one_second() {
    let fps = derive_frame_rate(1, Duration::ZERO).unwrap();
    assert!(fps.as_f64().is_finite());
    assert_eq!(fps.as_f64(), 1.0);

    assert_eq!(derive_frame_rate(7, Duration::ZERO).unwrap().as_f64(), 7.0);
}

#[test]
fn max_seen_combines_widest_and_tallest_frames() {
    let mut s = VideoSession::with_sink(deferred_png(), InMemorySink::new()).unwrap();
    // Shapes are (height, width).
    s.update(&Frame::solid(10, 30, [0, 0, 0])).unwrap();
    s.update(&Frame::solid(20, 5, [0, 0, 0])).unwrap();
    assert_eq!(s.max_seen, Resolution::new(30, 20));
    assert_eq!(s.current_resolution(), Resolution::new(30, 20));
}

#[test]
fn timestamps_come_from_the_injected_clock() {
    let clock = ManualClock::new();
    let mut s = VideoSession::with_sink(deferred_png(), InMemorySink::new())
        .unwrap()
        .with_clock(clock.clone());

    clock.set(Duration::from_secs(5));
    s.update(&Frame::solid(2, 2, [0, 0, 0])).unwrap();
    clock.advance(Duration::from_millis(250));
    s.update(&Frame::solid(2, 2, [0, 0, 0])).unwrap();

    assert_eq!(s.started_at, Some(Duration::from_secs(5)));
    assert_eq!(s.elapsed(), Duration::from_millis(250));
}

#[test]
fn failed_export_blocks_further_use() {
    let opts = SessionOpts::new("unused.mp4")
        .with_staged_image_format("png")
        .with_frame_rate(FrameRate::Fixed(10.0));
    let mut s = VideoSession::with_sink(opts, InMemorySink::new()).unwrap();
    s.update(&Frame::solid(4, 4, [1, 1, 1])).unwrap();

    // Remove a staged frame behind the session's back so assembly fails.
    std::fs::remove_file(&s.staged_frame_paths()[0]).unwrap();
    let dir = s.staging_dir().unwrap().to_path_buf();

    assert!(matches!(s.export().unwrap_err(), VidreelError::Io(_)));
    assert!(!dir.exists());
    assert!(s.is_exported());
    assert!(s.report().is_none());
    assert!(matches!(s.export().unwrap_err(), VidreelError::State(_)));
}

#[test]
fn failed_push_still_ends_the_stream_and_keeps_the_first_error() {
    let sink = FlakySink {
        fail_push: true,
        fail_end: true,
        ..FlakySink::default()
    };
    let mut s = VideoSession::with_sink(fixed_png(), sink).unwrap();
    s.update(&Frame::solid(4, 4, [1, 2, 3])).unwrap();
    let dir = s.staging_dir().unwrap().to_path_buf();

    let err = s.export().unwrap_err();
    assert!(err.to_string().contains("disk full"), "{err}");
    assert!(s.sink().began);
    assert!(s.sink().ended, "stream must be closed after a failed export");
    assert!(!dir.exists());
    assert!(s.report().is_none());
}

#[test]
fn failed_end_is_reported_after_all_frames_are_pushed() {
    let sink = FlakySink {
        fail_end: true,
        ..FlakySink::default()
    };
    let mut s = VideoSession::with_sink(fixed_png(), sink).unwrap();
    for _ in 0..3 {
        s.update(&Frame::solid(4, 4, [0, 0, 0])).unwrap();
    }
    let err = s.export().unwrap_err();
    assert!(err.to_string().contains("encoder crashed"), "{err}");
    assert_eq!(s.sink().pushed, 3);
}

#[test]
fn cap_error_wins_over_a_failed_forced_export() {
    let sink = FlakySink {
        fail_push: true,
        ..FlakySink::default()
    };
    let clock = ManualClock::new();
    let mut s = VideoSession::with_sink(fixed_png().with_duration_cap_hours(0.0001), sink)
        .unwrap()
        .with_clock(clock.clone());

    s.update(&Frame::solid(4, 4, [0, 0, 0])).unwrap();
    clock.advance(Duration::from_secs(1));
    let err = s.update(&Frame::solid(4, 4, [0, 0, 0])).unwrap_err();

    assert!(matches!(err, VidreelError::CapacityExceeded { .. }), "{err}");
    assert!(s.sink().ended);
    assert!(s.is_exported());
    assert!(s.report().is_none());
}

#[test]
fn missing_output_file_after_end_is_an_io_error() {
    let root = tempfile::tempdir().unwrap();
    let sink = FlakySink {
        output: Some(root.path().join("never_written.mp4")),
        ..FlakySink::default()
    };
    let mut s = VideoSession::with_sink(fixed_png(), sink).unwrap();
    s.update(&Frame::solid(4, 4, [0, 0, 0])).unwrap();

    assert!(matches!(s.export().unwrap_err(), VidreelError::Io(_)));
    assert!(s.sink().ended);
}

#[test]
fn output_file_size_is_reported_from_the_sink_path() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("written.mp4");
    std::fs::write(&out, vec![0u8; 2048]).unwrap();
    let sink = FlakySink {
        output: Some(out),
        ..FlakySink::default()
    };
    let mut s = VideoSession::with_sink(fixed_png(), sink).unwrap();
    s.update(&Frame::solid(4, 4, [0, 0, 0])).unwrap();

    assert_eq!(s.export().unwrap().file_size_bytes, 2048);
}
