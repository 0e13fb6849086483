use super::*;

#[test]
fn new_validates_shape_and_length() {
    assert!(Frame::new(2, 2, 3, vec![0; 12]).is_ok());
    assert!(Frame::new(2, 2, 4, vec![0; 16]).is_ok());
    assert!(Frame::new(2, 2, 3, vec![0; 11]).is_err());
    assert!(Frame::new(2, 2, 1, vec![0; 4]).is_err());
    assert!(Frame::new(0, 2, 3, vec![]).is_err());
}

#[test]
fn shape_is_height_width_channels() {
    let f = Frame::solid(120, 80, [1, 2, 3]);
    assert_eq!(f.shape(), (120, 80, 3));
    assert_eq!(f.resolution(), Resolution::new(80, 120));
    assert_eq!(&f.data()[..3], &[1, 2, 3]);
}

#[test]
fn bgr_is_swapped_to_rgb() {
    let f = Frame::new(1, 2, 3, vec![10, 20, 30, 40, 50, 60]).unwrap();
    let rgb = f.to_rgb_image(ChannelOrder::Bgr);
    assert_eq!(rgb.as_raw(), &vec![30, 20, 10, 60, 50, 40]);

    let same = f.to_rgb_image(ChannelOrder::Rgb);
    assert_eq!(same.as_raw(), f.data());
}

#[test]
fn alpha_channel_is_dropped() {
    let f = Frame::new(1, 1, 4, vec![1, 2, 3, 128]).unwrap();
    assert_eq!(f.to_rgb_image(ChannelOrder::Rgb).as_raw(), &vec![1, 2, 3]);
    assert_eq!(f.to_rgb_image(ChannelOrder::Bgr).as_raw(), &vec![3, 2, 1]);
}

#[test]
fn fit_to_canvas_borrows_when_sizes_match() {
    let img = RgbImage::from_pixel(4, 2, image::Rgb([9, 9, 9]));
    assert!(matches!(
        fit_to_canvas(&img, Resolution::new(4, 2)),
        Cow::Borrowed(_)
    ));
}

#[test]
fn fit_to_canvas_pads_bottom_right_with_black() {
    let img = RgbImage::from_pixel(2, 1, image::Rgb([200, 100, 50]));
    let out = fit_to_canvas(&img, Resolution::new(3, 2));
    assert_eq!(out.dimensions(), (3, 2));
    assert_eq!(out.get_pixel(0, 0).0, [200, 100, 50]);
    assert_eq!(out.get_pixel(1, 0).0, [200, 100, 50]);
    assert_eq!(out.get_pixel(2, 0).0, [0, 0, 0]);
    assert_eq!(out.get_pixel(0, 1).0, [0, 0, 0]);
}

#[test]
fn fit_to_canvas_crops_overflow() {
    let img = RgbImage::from_pixel(5, 5, image::Rgb([7, 7, 7]));
    let out = fit_to_canvas(&img, Resolution::new(2, 3));
    assert_eq!(out.dimensions(), (2, 3));
    assert!(out.pixels().all(|p| p.0 == [7, 7, 7]));
}
