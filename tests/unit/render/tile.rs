use super::*;

fn tile(brightness: f64) -> Tile {
    Tile {
        x: 24,
        y: 36,
        rgb: Rgb8::new(200, 100, 50),
        brightness,
    }
}

fn style() -> TileStyle {
    TileStyle::new(&RenderParams::default(), AnimationFlags::STILL)
}

fn extent(mode: Mode, b: f64) -> f64 {
    tile_primitive(mode, &tile(b), &style()).map_or(0.0, |p| p.extent())
}

const STEPS: [f64; 11] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

#[test]
fn classic_shrinks_as_brightness_grows() {
    for w in STEPS.windows(2) {
        assert!(extent(Mode::Classic, w[0]) > extent(Mode::Classic, w[1]));
    }
}

#[test]
fn colored_modes_grow_with_brightness() {
    for mode in [Mode::Rgb, Mode::Led, Mode::Squares, Mode::Duotone] {
        for w in STEPS.windows(2) {
            assert!(
                extent(mode, w[0]) <= extent(mode, w[1]),
                "{mode} not monotonic at {w:?}"
            );
        }
        assert!(extent(mode, 0.0) < extent(mode, 1.0));
    }
}

#[test]
fn brightness_extremes_give_documented_sizes() {
    let s = style();
    let Some(Primitive::Circle { radius, color, .. }) = tile_primitive(Mode::Classic, &tile(0.0), &s)
    else {
        panic!("classic always yields a circle");
    };
    assert_eq!(radius, 6.0);
    assert_eq!(color, Rgb8::BLACK);
    assert_eq!(extent(Mode::Classic, 1.0), 0.0);

    assert_eq!(extent(Mode::Rgb, 0.0), 0.0);
    assert!((extent(Mode::Rgb, 1.0) - 12.0 / 2.2).abs() < 1e-12);

    assert_eq!(extent(Mode::Squares, 0.0), 0.0);
    assert_eq!(extent(Mode::Squares, 1.0), 6.0);
}

#[test]
fn tile_center_is_offset_by_half_resolution() {
    let p = tile_primitive(Mode::Rgb, &tile(0.5), &style()).unwrap();
    let Primitive::Circle { center, .. } = p else {
        panic!("rgb yields a circle");
    };
    assert_eq!(center, Point::new(30.0, 42.0));
}

#[test]
fn led_skips_small_dots_and_carries_glow() {
    assert_eq!(tile_primitive(Mode::Led, &tile(0.0), &style()), None);
    // 12 / 2.5 * 0.1 = 0.48 <= 0.5
    assert_eq!(tile_primitive(Mode::Led, &tile(0.1), &style()), None);
    let Some(Primitive::GlowCircle { radius, blur, color, .. }) =
        tile_primitive(Mode::Led, &tile(1.0), &style())
    else {
        panic!("bright led tile yields a glow circle");
    };
    assert!((radius - 4.8).abs() < 1e-12);
    assert!((blur - 9.6).abs() < 1e-12);
    assert_eq!(color, Rgb8::new(200, 100, 50));
}

#[test]
fn ascii_ramp_ends() {
    assert_eq!(ascii_ramp_index(1.0), 0);
    assert_eq!(ASCII_RAMP[ascii_ramp_index(1.0)], ' ');
    assert_eq!(ascii_ramp_index(0.0), ASCII_RAMP_LAST);
    assert_eq!(ascii_ramp_index(-3.0), ASCII_RAMP_LAST);
    assert_eq!(ascii_ramp_index(2.0), 0);
    assert_eq!(ascii_ramp_index(0.5), 5);
}

#[test]
fn ascii_font_size_floors() {
    let Some(Primitive::Glyph { font_size, ramp_index, .. }) =
        tile_primitive(Mode::Ascii, &tile(0.3), &style())
    else {
        panic!("ascii yields a glyph");
    };
    // floor(12 * 0.85) = 10
    assert_eq!(font_size, 10);
    assert_eq!(ramp_index, 7);
}

#[test]
fn ascii_jitter_only_when_enabled() {
    let live = TileStyle::new(&RenderParams::default().at_time(1.3), AnimationFlags::LIVE);
    assert_eq!(live.ascii_jitter_time, Some(1.3));
    let factor = ascii_jitter(1.3, 24, 36);
    assert!((0.4..=1.0).contains(&factor));

    let Some(Primitive::Glyph { ramp_index, .. }) = tile_primitive(Mode::Ascii, &tile(0.8), &live)
    else {
        panic!("ascii yields a glyph");
    };
    assert_eq!(ramp_index, ascii_ramp_index(0.8 * factor));
    assert_eq!(style().ascii_jitter_time, None);
}

#[test]
fn duotone_interpolates_between_endpoints() {
    let s = TileStyle::new(
        &RenderParams {
            duotone_low: "#000000".into(),
            duotone_high: "#FFFFFF".into(),
            ..RenderParams::default()
        },
        AnimationFlags::STILL,
    );
    let color_at = |b: f64| tile_primitive(Mode::Duotone, &tile(b), &s).unwrap().color();
    assert_eq!(color_at(0.0), Rgb8::new(0, 0, 0));
    assert_eq!(color_at(1.0), Rgb8::new(255, 255, 255));
    let mid = color_at(0.5);
    assert!(mid.r == 127 || mid.r == 128);
    assert_eq!(mid.r, mid.g);
    assert_eq!(mid.g, mid.b);
}

#[test]
fn sample_reads_top_left_pixel() {
    let width = 2;
    let pixels = [
        10, 20, 30, 255, 0, 0, 0, 255, //
        0, 0, 0, 255, 255, 255, 255, 255,
    ];
    let t = Tile::sample(&pixels, width, 1, 1);
    assert_eq!(t.rgb, Rgb8::WHITE);
    assert!((t.brightness - 1.0).abs() < 1e-12);
    let t = Tile::sample(&pixels, width, 0, 0);
    assert_eq!(t.rgb, Rgb8::new(10, 20, 30));
}
