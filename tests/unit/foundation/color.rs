use super::*;

#[test]
fn luma_spans_unit_interval() {
    assert_eq!(luma(0, 0, 0), 0.0);
    assert!((luma(255, 255, 255) - 1.0).abs() < 1e-12);
    assert!(luma(0, 255, 0) > luma(255, 0, 0));
    assert!(luma(255, 0, 0) > luma(0, 0, 255));
}

#[test]
fn parse_hex_accepts_both_forms() {
    assert_eq!(Rgb8::parse_hex("#FF8000"), Some(Rgb8::new(255, 128, 0)));
    assert_eq!(Rgb8::parse_hex("ff8000"), Some(Rgb8::new(255, 128, 0)));
    assert_eq!(Rgb8::parse_hex(" #0a0B0c "), Some(Rgb8::new(10, 11, 12)));
}

#[test]
fn malformed_hex_falls_back_to_black() {
    for bad in ["", "#", "#fff", "#12345g", "#+f+f+f", "#1234567", "not a color", "#ééé"] {
        assert_eq!(Rgb8::parse_hex_or_black(bad), Rgb8::BLACK, "{bad:?}");
    }
}

#[test]
fn lerp_black_to_white_rounds_half_up() {
    let lo = Rgb8::BLACK;
    let hi = Rgb8::WHITE;
    assert_eq!(lo.lerp(hi, 0.0), Rgb8::BLACK);
    assert_eq!(lo.lerp(hi, 1.0), Rgb8::WHITE);
    assert_eq!(lo.lerp(hi, 0.5), Rgb8::new(128, 128, 128));
}

#[test]
fn hex_round_trips_through_formatting() {
    let c = Rgb8::new(1, 2, 254);
    assert_eq!(c.to_hex(), "#0102fe");
    assert_eq!(Rgb8::parse_hex(&c.to_hex()), Some(c));
}
