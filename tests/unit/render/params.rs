use super::*;

#[test]
fn selectors_round_trip_and_unknown_is_none() {
    for m in Mode::ALL {
        assert_eq!(Mode::from_selector(m.as_str()), Some(m));
        assert_eq!(m.as_str().parse::<Mode>().unwrap(), m);
    }
    assert_eq!(Mode::from_selector("sepia"), None);
}

#[test]
fn selectors_match_exactly() {
    for s in [" classic", "classic ", "Classic", "LED", "", "duotone\n"] {
        assert_eq!(Mode::from_selector(s), None, "{s:?}");
    }
    assert!("sepia".parse::<Mode>().is_err());
}

#[test]
fn table_index_matches_all_order() {
    for (i, m) in Mode::ALL.into_iter().enumerate() {
        assert_eq!(m.index(), i);
    }
}

#[test]
fn background_is_white_only_for_classic() {
    assert_eq!(Mode::background(Some(Mode::Classic)), Rgb8::WHITE);
    for m in [Mode::Rgb, Mode::Led, Mode::Squares, Mode::Ascii, Mode::Duotone] {
        assert_eq!(Mode::background(Some(m)), Rgb8::BLACK);
    }
    assert_eq!(Mode::background(None), Rgb8::BLACK);
}

#[test]
fn defaults_match_reset_values() {
    let p = RenderParams::default();
    assert_eq!(p.resolution, 12);
    assert_eq!(p.radius_multiplier, 1.0);
    assert_eq!(p.contrast, 1.2);
    assert_eq!(p.mode, Some(Mode::Classic));
    p.validate().unwrap();
}

#[test]
fn validate_rejects_degenerate_values() {
    let base = RenderParams::default();
    assert!(
        RenderParams {
            resolution: 0,
            ..base.clone()
        }
        .validate()
        .is_err()
    );
    assert!(
        RenderParams {
            radius_multiplier: 0.0,
            ..base.clone()
        }
        .validate()
        .is_err()
    );
    assert!(
        RenderParams {
            contrast: f64::NAN,
            ..base
        }
        .validate()
        .is_err()
    );
}

#[test]
fn radius_modulation_follows_sine_band() {
    let p = RenderParams::default();
    assert_eq!(p.effective_radius_multiplier(AnimationFlags::STILL), 1.0);
    let peak = p.at_time(std::f64::consts::FRAC_PI_2);
    assert!((peak.effective_radius_multiplier(AnimationFlags::LIVE) - 1.0).abs() < 1e-12);
    let trough = p.at_time(3.0 * std::f64::consts::FRAC_PI_2);
    assert!((trough.effective_radius_multiplier(AnimationFlags::LIVE) - 0.6).abs() < 1e-12);
    assert!((p.effective_radius_multiplier(AnimationFlags::LIVE) - 0.8).abs() < 1e-12);
}

#[test]
fn json_accepts_unknown_mode_as_background_only() {
    let p: RenderParams = serde_json::from_str(r#"{"mode":"sepia","resolution":8}"#).unwrap();
    assert_eq!(p.mode, None);
    assert_eq!(p.resolution, 8);
    assert_eq!(p.contrast, 1.2);

    let p: RenderParams = serde_json::from_str(r#"{"mode":"duotone"}"#).unwrap();
    assert_eq!(p.mode, Some(Mode::Duotone));
}

#[test]
fn duotone_colors_fall_back_to_black() {
    let p = RenderParams {
        duotone_low: "oops".into(),
        duotone_high: "#FFFFFF".into(),
        ..RenderParams::default()
    };
    assert_eq!(p.duotone_colors(), (Rgb8::BLACK, Rgb8::WHITE));
}
