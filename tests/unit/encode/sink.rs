use super::*;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig::new(Resolution::new(width, height), Fps::new(30, 1).unwrap())
}

#[test]
fn in_memory_sink_records_frames_in_push_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2)).unwrap();
    for i in 0..3u8 {
        let img = RgbImage::from_pixel(2, 2, image::Rgb([i, i, i]));
        sink.push_frame(FrameIndex(u64::from(i)), &img).unwrap();
    }
    sink.end().unwrap();

    assert!(sink.is_finished());
    assert_eq!(sink.config().unwrap().resolution(), Resolution::new(2, 2));
    let shades: Vec<u8> = sink.frames().iter().map(|(_, f)| f.get_pixel(0, 0).0[0]).collect();
    assert_eq!(shades, vec![0, 1, 2]);
}

#[test]
fn in_memory_sink_rejects_push_before_begin() {
    let mut sink = InMemorySink::new();
    let err = sink
        .push_frame(FrameIndex(0), &RgbImage::new(2, 2))
        .unwrap_err();
    assert!(matches!(err, VidreelError::State(_)));
}

#[test]
fn in_memory_sink_rejects_wrong_size() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(4, 4)).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &RgbImage::new(2, 2)).is_err());
}
