use super::*;
use crate::foundation::core::Size;
use crate::schedule::clock::{ClockEvent, ManualClock};

fn gray(v: u8) -> SourceFrame {
    SourceFrame::still(image::RgbaImage::from_pixel(48, 36, image::Rgba([v, v, v, 255])))
}

/// Video whose frame at `t` is a solid gray encoding `t`.
struct RampVideo {
    duration: f64,
    seeks: Vec<f64>,
}

impl SeekableSource for RampVideo {
    fn duration_secs(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, time_secs: f64) -> HalftoneResult<SourceFrame> {
        self.seeks.push(time_secs);
        let v = (time_secs * 100.0).round().clamp(0.0, 255.0) as u8;
        Ok(SourceFrame::video(image::RgbaImage::from_pixel(
            16,
            8,
            image::Rgba([v, v, v, 255]),
        )))
    }
}

#[test]
fn animator_advances_phase_before_each_frame() {
    let mut anim = LiveAnimator::new();
    let mut renderer = Renderer::new();
    let mut canvas = Canvas::new();
    let src = gray(128);
    let params = RenderParams::default();

    assert_eq!(anim.state(), DriverState::Idle);
    assert_eq!(
        anim.tick(&mut renderer, Some(&src), &params, &mut canvas).unwrap(),
        None
    );
    assert!(canvas.is_empty());

    anim.start();
    assert_eq!(anim.state(), DriverState::Running);
    for _ in 0..3 {
        let out = anim.tick(&mut renderer, Some(&src), &params, &mut canvas).unwrap();
        assert!(out.is_some_and(|o| o.is_drawn()));
    }
    assert!((anim.phase() - 0.15).abs() < 1e-12);
    assert_eq!(canvas.size(), Size::new(48, 36));

    anim.stop();
    assert_eq!(anim.state(), DriverState::Idle);
    assert_eq!(
        anim.tick(&mut renderer, Some(&src), &params, &mut canvas).unwrap(),
        None
    );
    assert!((anim.phase() - 0.15).abs() < 1e-12);
}

#[test]
fn animated_frames_change_over_time() {
    let mut anim = LiveAnimator::new();
    let mut renderer = Renderer::new();
    let mut canvas = Canvas::new();
    let src = gray(128);
    let params = RenderParams::default();
    anim.start();

    anim.tick(&mut renderer, Some(&src), &params, &mut canvas).unwrap();
    let first = canvas.clone();
    for _ in 0..10 {
        anim.tick(&mut renderer, Some(&src), &params, &mut canvas).unwrap();
    }
    assert_ne!(first, canvas);
}

#[test]
fn run_waits_one_refresh_per_frame() {
    let mut anim = LiveAnimator::new();
    let mut renderer = Renderer::new();
    let mut canvas = Canvas::new();
    let mut clock = ManualClock::new(60);
    let mut seen = Vec::new();

    let frames = anim
        .run(
            &mut clock,
            &mut renderer,
            Some(&gray(40)),
            &RenderParams::default(),
            &mut canvas,
            Some(5),
            |i, c| {
                seen.push((i, c.size()));
                Ok(())
            },
        )
        .unwrap();

    assert_eq!(frames, 5);
    assert_eq!(seen.len(), 5);
    assert_eq!(seen[4], (4, Size::new(48, 36)));
    assert_eq!(clock.events().len(), 5);
    assert!(
        clock
            .events()
            .iter()
            .all(|e| matches!(e, ClockEvent::Refresh(_)))
    );
    assert!((anim.phase() - 0.25).abs() < 1e-12);
    assert_eq!(anim.state(), DriverState::Idle);
}

#[test]
fn cancel_lets_the_in_flight_frame_finish() {
    let mut anim = LiveAnimator::new();
    let mut renderer = Renderer::new();
    let mut canvas = Canvas::new();
    let mut clock = ManualClock::new(60);
    let token = anim.start();

    let frames = anim
        .run(
            &mut clock,
            &mut renderer,
            Some(&gray(40)),
            &RenderParams::default(),
            &mut canvas,
            None,
            |i, _| {
                if i == 2 {
                    token.cancel();
                }
                Ok(())
            },
        )
        .unwrap();

    assert_eq!(frames, 3);
    assert_eq!(anim.state(), DriverState::Idle);
}

#[test]
fn run_without_source_keeps_ticking() {
    let mut anim = LiveAnimator::new();
    let mut canvas = Canvas::new();
    let frames = anim
        .run(
            &mut ManualClock::default(),
            &mut Renderer::new(),
            None,
            &RenderParams::default(),
            &mut canvas,
            Some(3),
            |_, _| Ok(()),
        )
        .unwrap();
    assert_eq!(frames, 3);
    assert!(canvas.is_empty());
}

#[test]
fn pause_and_resume_keep_phase() {
    let mut anim = LiveAnimator::new();
    assert!(!anim.pause());
    anim.start();
    assert!(anim.pause());
    assert_eq!(anim.state(), DriverState::Paused);
    let mut canvas = Canvas::new();
    assert_eq!(
        anim.tick(
            &mut Renderer::new(),
            Some(&gray(1)),
            &RenderParams::default(),
            &mut canvas
        )
        .unwrap(),
        None
    );
    anim.resume();
    assert_eq!(anim.state(), DriverState::Running);
    assert_eq!(anim.phase(), 0.0);
}

#[test]
fn video_preview_loops_at_the_end() {
    let mut preview = VideoPreview::new();
    let mut source = RampVideo {
        duration: 0.09,
        seeks: Vec::new(),
    };
    let mut renderer = Renderer::new();
    let mut canvas = Canvas::new();
    let step = Duration::from_secs_f64(1.0 / 30.0);

    preview.start();
    for _ in 0..4 {
        preview
            .tick(step, &mut source, &mut renderer, &RenderParams::default(), &mut canvas)
            .unwrap();
    }

    assert_eq!(source.seeks.len(), 4);
    assert_eq!(source.seeks[0], 0.0);
    assert!((source.seeks[1] - 1.0 / 30.0).abs() < 1e-6);
    assert!((source.seeks[2] - 2.0 / 30.0).abs() < 1e-6);
    // 3/30 is past the end, so playback wrapped.
    assert_eq!(source.seeks[3], 0.0);
    assert_eq!(canvas.size(), Size::new(16, 8));
}

#[test]
fn video_preview_pause_blocks_rendering() {
    let mut preview = VideoPreview::new();
    let mut source = RampVideo {
        duration: 1.0,
        seeks: Vec::new(),
    };
    let mut canvas = Canvas::new();
    preview.start();
    assert!(preview.pause());
    let out = preview
        .tick(
            Duration::from_millis(16),
            &mut source,
            &mut Renderer::new(),
            &RenderParams::default(),
            &mut canvas,
        )
        .unwrap();
    assert_eq!(out, None);
    assert!(source.seeks.is_empty());

    preview.resume();
    assert_eq!(preview.state(), DriverState::Running);
    assert_eq!(preview.position(), 0.0);
}

#[test]
fn video_preview_run_uses_refresh_interval() {
    let mut preview = VideoPreview::new();
    let mut source = RampVideo {
        duration: 10.0,
        seeks: Vec::new(),
    };
    let mut clock = ManualClock::new(50);
    let frames = preview
        .run(
            &mut clock,
            &mut source,
            &mut Renderer::new(),
            &RenderParams::default(),
            &mut Canvas::new(),
            Some(3),
            |_, _| Ok(()),
        )
        .unwrap();
    assert_eq!(frames, 3);
    assert_eq!(source.seeks.len(), 3);
    assert!((source.seeks[2] - 0.04).abs() < 1e-9);
    assert!((preview.position() - 0.06).abs() < 1e-9);
    assert_eq!(preview.state(), DriverState::Idle);
}
