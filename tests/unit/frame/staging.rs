use super::*;

#[test]
fn staged_format_accepts_common_extensions() {
    assert_eq!(staged_image_format("jpg").unwrap(), ImageFormat::Jpeg);
    assert_eq!(staged_image_format(".png").unwrap(), ImageFormat::Png);
    assert_eq!(staged_image_format("BMP").unwrap(), ImageFormat::Bmp);
}

#[test]
fn staged_format_rejects_unknown_extension() {
    let err = staged_image_format("notanimage").unwrap_err();
    assert!(matches!(err, VidreelError::Configuration(_)));
}

#[test]
fn frame_paths_are_deterministic_and_ordered() {
    let staging = StagingArea::new("png").unwrap();
    let p0 = staging.frame_path(FrameIndex(0));
    let p12 = staging.frame_path(FrameIndex(12));
    assert_eq!(p0.file_name().unwrap(), "frame_00000000.png");
    assert_eq!(p12.file_name().unwrap(), "frame_00000012.png");
    assert!(p0 < p12);
    assert!(p0.starts_with(staging.path()));
}

#[test]
fn stage_then_load_preserves_png_pixels() {
    let mut staging = StagingArea::new("png").unwrap();
    let img = RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8 * 40, y as u8 * 90, 7]));

    staging.stage(FrameIndex(0), &img).unwrap();
    assert_eq!(staging.len(), 1);

    let back = StagingArea::load(&staging.paths()[0]).unwrap();
    assert_eq!(back, img);
}

#[test]
fn close_removes_directory() {
    let mut staging = StagingArea::new("jpg").unwrap();
    staging
        .stage(FrameIndex(0), &RgbImage::new(4, 4))
        .unwrap();
    let dir = staging.path().to_path_buf();
    assert!(dir.exists());

    staging.close().unwrap();
    assert!(!dir.exists());
}

#[test]
fn two_areas_never_share_a_directory() {
    let a = StagingArea::new("jpg").unwrap();
    let b = StagingArea::new("jpg").unwrap();
    assert_ne!(a.path(), b.path());
}

#[test]
fn load_missing_file_is_io_error() {
    let staging = StagingArea::new("png").unwrap();
    let err = StagingArea::load(&staging.frame_path(FrameIndex(3))).unwrap_err();
    assert!(matches!(err, VidreelError::Io(_)));
}
