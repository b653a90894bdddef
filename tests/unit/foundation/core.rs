use super::*;

#[test]
fn small_sizes_are_left_alone() {
    let s = Size::new(640, 480);
    assert_eq!(s.fit_long_edge(MAX_CANVAS_EDGE), s);
    assert_eq!(Size::new(1920, 1920).fit_long_edge(MAX_CANVAS_EDGE), Size::new(1920, 1920));
}

#[test]
fn landscape_scales_to_long_edge() {
    assert_eq!(
        Size::new(3840, 2160).fit_long_edge(MAX_CANVAS_EDGE),
        Size::new(1920, 1080)
    );
    assert_eq!(
        Size::new(4000, 3000).fit_long_edge(MAX_CANVAS_EDGE),
        Size::new(1920, 1440)
    );
}

#[test]
fn portrait_and_square_scale_to_long_edge() {
    assert_eq!(
        Size::new(1000, 4000).fit_long_edge(MAX_CANVAS_EDGE),
        Size::new(480, 1920)
    );
    assert_eq!(
        Size::new(2500, 2500).fit_long_edge(MAX_CANVAS_EDGE),
        Size::new(1920, 1920)
    );
}

#[test]
fn fractional_heights_truncate() {
    // 1920 / (3001 / 1000) = 639.78..
    assert_eq!(
        Size::new(3001, 1000).fit_long_edge(MAX_CANVAS_EDGE),
        Size::new(1920, 639)
    );
}

#[test]
fn fit_width_only_caps_width() {
    assert_eq!(Size::new(1280, 720).fit_width(1920), Size::new(1280, 720));
    assert_eq!(Size::new(3840, 2160).fit_width(1920), Size::new(1920, 1080));
    // Tall video: width is under the cap, height is untouched.
    assert_eq!(Size::new(1080, 2400).fit_width(1920), Size::new(1080, 2400));
}

#[test]
fn fps_frame_math() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_floor(2.0), 60);
    assert_eq!(fps.secs_to_frames_floor(2.049), 61);
    assert!((fps.frame_time_secs(59) - 59.0 / 30.0).abs() < 1e-12);
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}
