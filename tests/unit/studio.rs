use super::*;
use crate::foundation::core::{Fps, Size};
use crate::schedule::clock::ManualClock;

fn gray(v: u8) -> SourceFrame {
    SourceFrame::still(image::RgbaImage::from_pixel(40, 30, image::Rgba([v, v, v, 255])))
}

struct FlatVideo {
    duration: f64,
}

impl SeekableSource for FlatVideo {
    fn duration_secs(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, _time_secs: f64) -> HalftoneResult<SourceFrame> {
        Ok(SourceFrame::video(image::RgbaImage::from_pixel(
            24,
            12,
            image::Rgba([90, 90, 90, 255]),
        )))
    }
}

#[derive(Default)]
struct CountingRecorder {
    started: Option<Size>,
    frames: u64,
    stopped: bool,
}

impl FrameRecorder for CountingRecorder {
    fn start(&mut self, size: Size, _fps: Fps) -> HalftoneResult<()> {
        self.started = Some(size);
        Ok(())
    }

    fn capture(&mut self, _canvas: &Canvas) -> HalftoneResult<()> {
        self.frames += 1;
        Ok(())
    }

    fn stop(&mut self) -> HalftoneResult<()> {
        self.stopped = true;
        Ok(())
    }

    fn abort(&mut self) {}
}

#[test]
fn empty_studio_renders_nothing() {
    let mut studio = Studio::default();
    assert!(!studio.has_source());
    assert_eq!(studio.activity(), Activity::Idle);
    assert_eq!(studio.render().unwrap(), RenderOutcome::NoSource);
    assert!(studio.canvas().is_empty());
}

#[test]
fn loading_an_image_renders_it() {
    let mut studio = Studio::default();
    let out = studio.set_image(gray(128)).unwrap();
    assert!(out.is_drawn());
    assert_eq!(studio.canvas().size(), Size::new(40, 30));
}

#[test]
fn animation_ticks_only_while_running() {
    let mut studio = Studio::default();
    studio.set_image(gray(128)).unwrap();
    assert_eq!(studio.tick(Duration::from_millis(16)).unwrap(), None);

    let token = studio.start_animation().unwrap();
    assert_eq!(studio.activity(), Activity::Animating);
    assert!(studio.tick(Duration::from_millis(16)).unwrap().is_some());

    token.cancel();
    assert_eq!(studio.tick(Duration::from_millis(16)).unwrap(), None);
    assert_eq!(studio.activity(), Activity::Idle);
}

#[test]
fn exports_are_exclusive() {
    let mut studio = Studio::default();
    studio.set_image(gray(128)).unwrap();
    studio.start_animation().unwrap();

    let ticket = studio.begin_export(ExportKind::Gif).unwrap();
    assert_eq!(studio.activity(), Activity::ExportingGif);
    let err = studio.begin_export(ExportKind::Video).unwrap_err();
    assert!(matches!(err, HalftoneError::Busy(_)));
    assert!(studio.start_animation().is_err());
    assert!(studio.set_image(gray(10)).is_err());

    studio.finish_export(ticket).unwrap();
    assert_eq!(studio.activity(), Activity::Animating);
}

#[test]
fn gif_export_without_image_is_a_no_op() {
    let mut studio = Studio::default();
    let bytes = studio.export_gif(&CancelToken::new(), |_| {}).unwrap();
    assert!(bytes.is_none());
    assert_eq!(studio.activity(), Activity::Idle);
}

#[test]
fn gif_export_resumes_animation() {
    let mut studio = Studio::default();
    studio.set_image(gray(128)).unwrap();
    studio.start_animation().unwrap();

    let mut last = 0.0;
    let bytes = studio
        .export_gif(&CancelToken::new(), |p| last = p)
        .unwrap()
        .unwrap();
    assert!(bytes.starts_with(b"GIF89a"));
    assert_eq!(last, 1.0);
    assert_eq!(studio.activity(), Activity::Animating);
}

#[test]
fn cancelled_gif_export_releases_the_canvas() {
    let mut studio = Studio::default();
    studio.set_image(gray(128)).unwrap();
    let token = CancelToken::new();
    token.cancel();
    let err = studio.export_gif(&token, |_| {}).unwrap_err();
    assert!(err.is_cancelled());
    assert!(studio.begin_export(ExportKind::Gif).is_ok());
}

#[test]
fn video_replaces_image_and_exports() {
    let mut studio = Studio::default();
    studio.set_image(gray(128)).unwrap();
    studio.set_video(Box::new(FlatVideo { duration: 0.5 })).unwrap();
    assert_eq!(studio.activity(), Activity::PreviewingVideo);
    assert_eq!(studio.canvas().size(), Size::new(24, 12));

    // The image is gone, so GIF export has nothing to do.
    assert!(studio.export_gif(&CancelToken::new(), |_| {}).unwrap().is_none());

    let mut recorder = CountingRecorder::default();
    let mut clock = ManualClock::default();
    let report = studio
        .export_video(&mut recorder, &mut clock, &CancelToken::new(), |_| {})
        .unwrap()
        .unwrap();
    assert_eq!(report.frames, 15);
    assert_eq!(recorder.frames, 15);
    assert_eq!(recorder.started, Some(Size::new(24, 12)));
    assert!(recorder.stopped);
    assert_eq!(studio.activity(), Activity::PreviewingVideo);
}

#[test]
fn video_export_without_video_is_a_no_op() {
    let mut studio = Studio::default();
    let mut recorder = CountingRecorder::default();
    let report = studio
        .export_video(
            &mut recorder,
            &mut ManualClock::default(),
            &CancelToken::new(),
            |_| {},
        )
        .unwrap();
    assert!(report.is_none());
    assert_eq!(recorder.started, None);
}

#[test]
fn finishing_the_wrong_export_is_rejected() {
    let mut studio = Studio::default();
    let ticket = studio.begin_export(ExportKind::Gif).unwrap();
    assert!(
        studio
            .finish_export(ExportTicket {
                kind: ExportKind::Video
            })
            .is_err()
    );
    studio.finish_export(ticket).unwrap();
}
