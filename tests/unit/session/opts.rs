use super::*;

fn immediate() -> SessionOpts {
    SessionOpts::new("out.mp4")
        .with_export_mode(ExportMode::Immediate)
        .with_frame_rate(FrameRate::Fixed(30.0))
        .with_resolution(ResolutionSetting::Fixed(Resolution::new(64, 48)))
}

#[test]
fn defaults_are_automatic_and_deferred() {
    let opts = SessionOpts::default();
    assert_eq!(opts.frame_rate, FrameRate::Auto);
    assert_eq!(opts.resolution, ResolutionSetting::Auto);
    assert_eq!(opts.export_mode, ExportMode::Deferred);
    assert_eq!(opts.staged_image_format, "jpg");
    assert_eq!(opts.duration_cap(), None);
    assert!(opts.validate().is_ok());
}

#[test]
fn immediate_with_fixed_settings_is_valid() {
    assert!(immediate().validate().is_ok());
}

#[test]
fn immediate_rejects_automatic_settings() {
    let auto_rate = immediate().with_frame_rate(FrameRate::Auto);
    assert!(matches!(
        auto_rate.validate().unwrap_err(),
        VidreelError::Configuration(_)
    ));

    let auto_res = immediate().with_resolution(ResolutionSetting::Auto);
    assert!(matches!(
        auto_res.validate().unwrap_err(),
        VidreelError::Configuration(_)
    ));
}

#[test]
fn rejects_bad_values() {
    let bad = [
        SessionOpts::default().with_frame_rate(FrameRate::Fixed(0.0)),
        SessionOpts::default().with_frame_rate(FrameRate::Fixed(f64::NAN)),
        SessionOpts::default().with_frame_rate(FrameRate::Fixed(1e-7)),
        SessionOpts::default().with_resolution(ResolutionSetting::Fixed(Resolution::new(0, 10))),
        SessionOpts::default().with_duration_cap_hours(-1.0),
        SessionOpts::default().with_staged_image_format("xyz"),
        SessionOpts::new(""),
    ];
    for opts in bad {
        assert!(
            matches!(opts.validate(), Err(VidreelError::Configuration(_))),
            "{opts:?}"
        );
    }
}

#[test]
fn slow_fixed_rates_are_accepted_as_given() {
    for rate in [0.001, 23.976, 0.5] {
        let opts = SessionOpts::default().with_frame_rate(FrameRate::Fixed(rate));
        assert!(opts.validate().is_ok(), "{rate}");
    }
}

#[test]
fn duration_cap_zero_means_disabled() {
    assert_eq!(SessionOpts::default().with_duration_cap_hours(0.0).duration_cap(), None);
    assert_eq!(
        SessionOpts::default().with_duration_cap_hours(0.5).duration_cap(),
        Some(0.5)
    );
}

#[test]
fn loads_from_json_with_defaults() {
    let json = r#"{
        "output_path": "clips/run.mp4",
        "frame_rate": {"fixed": 24.0},
        "resolution": {"fixed": {"width": 320, "height": 240}},
        "export_mode": "immediate"
    }"#;
    let opts: SessionOpts = serde_json::from_str(json).unwrap();
    assert_eq!(opts.output_path, PathBuf::from("clips/run.mp4"));
    assert_eq!(opts.frame_rate, FrameRate::Fixed(24.0));
    assert_eq!(
        opts.resolution,
        ResolutionSetting::Fixed(Resolution::new(320, 240))
    );
    assert_eq!(opts.export_mode, ExportMode::Immediate);
    assert_eq!(opts.staged_image_format, "jpg");
    assert!(opts.validate().is_ok());

    let auto: SessionOpts = serde_json::from_str(r#"{"frame_rate": "auto"}"#).unwrap();
    assert_eq!(auto.frame_rate, FrameRate::Auto);
}
