//! Application state shared by the front end, the live drivers, and the exporters.

use std::path::Path;
use std::time::Duration;

use crate::assets::font::AsciiFont;
use crate::assets::media::{SeekableSource, VideoSource};
use crate::assets::source::{SourceFrame, load_image};
use crate::config::StudioConfig;
use crate::export::gif::export_gif;
use crate::export::video::{FrameRecorder, VideoExportReport, VideoProgress, export_video};
use crate::foundation::error::{HalftoneError, HalftoneResult};
use crate::render::canvas::Canvas;
use crate::render::params::{AnimationFlags, RenderParams};
use crate::render::pipeline::{RenderOutcome, Renderer};
use crate::schedule::cancel::CancelToken;
use crate::schedule::clock::FrameClock;
use crate::schedule::live::{DriverState, LiveAnimator, VideoPreview};

/// What currently owns the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Animating,
    PreviewingVideo,
    ExportingGif,
    ExportingVideo,
}

/// The two exclusive export kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Gif,
    Video,
}

/// Proof that an export holds the canvas; hand it back to [`Studio::finish_export`].
#[derive(Debug)]
#[must_use = "an unfinished export keeps the studio busy"]
pub struct ExportTicket {
    kind: ExportKind,
}

impl ExportTicket {
    pub fn kind(&self) -> ExportKind {
        self.kind
    }
}

#[derive(Debug)]
struct ActiveExport {
    kind: ExportKind,
    resume_animation: bool,
    resume_preview: bool,
}

/// One editing session: the loaded source, the parameters, the canvas, and the drivers.
///
/// Loading a new source replaces the previous one wholesale. Exports are exclusive with each
/// other and suspend whichever live driver was running until they finish.
pub struct Studio {
    config: StudioConfig,
    params: RenderParams,
    image: Option<SourceFrame>,
    video: Option<Box<dyn SeekableSource>>,
    canvas: Canvas,
    renderer: Renderer,
    animator: LiveAnimator,
    preview: VideoPreview,
    export: Option<ActiveExport>,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("params", &self.params)
            .field("has_image", &self.image.is_some())
            .field("has_video", &self.video.is_some())
            .field("canvas", &self.canvas.size())
            .field("activity", &self.activity())
            .finish_non_exhaustive()
    }
}

impl Default for Studio {
    fn default() -> Self {
        Self::new(StudioConfig::default())
    }
}

impl Studio {
    pub fn new(config: StudioConfig) -> Self {
        let renderer = match &config.font {
            Some(path) => Renderer::with_font_path(path.clone()),
            None => Renderer::new(),
        };
        Self {
            params: config.params.clone(),
            config,
            image: None,
            video: None,
            canvas: Canvas::new(),
            renderer,
            animator: LiveAnimator::new(),
            preview: VideoPreview::new(),
            export: None,
        }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Replace the parameters; they take effect on the next render.
    pub fn set_params(&mut self, params: RenderParams) {
        self.params = params;
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Use an already loaded ASCII font.
    pub fn set_font(&mut self, font: AsciiFont) {
        self.renderer.set_font(font);
    }

    pub fn has_source(&self) -> bool {
        self.image.is_some() || self.video.is_some()
    }

    pub fn activity(&self) -> Activity {
        match self.export.as_ref().map(|e| e.kind) {
            Some(ExportKind::Gif) => Activity::ExportingGif,
            Some(ExportKind::Video) => Activity::ExportingVideo,
            None if self.animator.state() == DriverState::Running => Activity::Animating,
            None if self.preview.state() == DriverState::Running => Activity::PreviewingVideo,
            None => Activity::Idle,
        }
    }

    fn ensure_not_exporting(&self) -> HalftoneResult<()> {
        match self.export.as_ref() {
            Some(active) => Err(HalftoneError::busy(format!(
                "{:?} export in progress",
                active.kind
            ))),
            None => Ok(()),
        }
    }

    /// Check and decode an image file, then show it.
    pub fn load_image(&mut self, path: &Path) -> HalftoneResult<RenderOutcome> {
        self.ensure_not_exporting()?;
        let frame = load_image(path)?;
        self.set_image(frame)
    }

    /// Show a decoded still, dropping any loaded video.
    pub fn set_image(&mut self, frame: SourceFrame) -> HalftoneResult<RenderOutcome> {
        self.ensure_not_exporting()?;
        self.preview.stop();
        self.video = None;
        self.image = Some(frame);
        self.render()
    }

    /// Check, probe, and open a video file, then start its preview.
    pub fn load_video(&mut self, path: &Path) -> HalftoneResult<RenderOutcome> {
        self.ensure_not_exporting()?;
        let fps = self.config.video.frame_rate()?;
        let source = VideoSource::open(path, fps)?;
        self.set_video(Box::new(source))
    }

    /// Show a video source, dropping any loaded image, and start its preview from 0.
    pub fn set_video(&mut self, source: Box<dyn SeekableSource>) -> HalftoneResult<RenderOutcome> {
        self.ensure_not_exporting()?;
        self.animator.stop();
        self.image = None;
        self.video = Some(source);
        self.preview.start();
        self.render()
    }

    /// Re-render the current state: the video at its playback position, or the image with the
    /// animation phase when animating.
    pub fn render(&mut self) -> HalftoneResult<RenderOutcome> {
        if let Some(video) = self.video.as_mut() {
            let frame = video.frame_at(self.preview.position())?;
            return self
                .renderer
                .render_video_frame(Some(&frame), &self.params, &mut self.canvas);
        }
        let (params, flags) = if self.animator.state() == DriverState::Running {
            (self.params.at_time(self.animator.phase()), AnimationFlags::LIVE)
        } else {
            (self.params.clone(), AnimationFlags::STILL)
        };
        self.renderer
            .render(self.image.as_ref(), &params, flags, &mut self.canvas)
    }

    /// Render the loaded image at animation phase `phase` with time-varying effects on.
    pub fn render_phase(&mut self, phase: f64) -> HalftoneResult<RenderOutcome> {
        self.renderer.render(
            self.image.as_ref(),
            &self.params.at_time(phase),
            AnimationFlags::LIVE,
            &mut self.canvas,
        )
    }

    /// Turn the animated preview on; the returned token stops it.
    pub fn start_animation(&mut self) -> HalftoneResult<CancelToken> {
        self.ensure_not_exporting()?;
        Ok(self.animator.start())
    }

    pub fn stop_animation(&mut self) {
        self.animator.stop();
    }

    /// Restart video playback from 0; the returned token stops it.
    pub fn start_preview(&mut self) -> HalftoneResult<CancelToken> {
        self.ensure_not_exporting()?;
        Ok(self.preview.start())
    }

    pub fn stop_preview(&mut self) {
        self.preview.stop();
    }

    /// One display refresh: advance whichever live driver is running.
    pub fn tick(&mut self, elapsed: Duration) -> HalftoneResult<Option<RenderOutcome>> {
        if let Some(video) = self.video.as_mut() {
            return self.preview.tick(
                elapsed,
                video.as_mut(),
                &mut self.renderer,
                &self.params,
                &mut self.canvas,
            );
        }
        self.animator.tick(
            &mut self.renderer,
            self.image.as_ref(),
            &self.params,
            &mut self.canvas,
        )
    }

    /// Drive the animated preview from `clock` for up to `max_frames` refreshes.
    pub fn run_animation<C, F>(
        &mut self,
        clock: &mut C,
        max_frames: Option<u64>,
        on_frame: F,
    ) -> HalftoneResult<u64>
    where
        C: FrameClock + ?Sized,
        F: FnMut(u64, &Canvas) -> HalftoneResult<()>,
    {
        self.ensure_not_exporting()?;
        self.animator.run(
            clock,
            &mut self.renderer,
            self.image.as_ref(),
            &self.params,
            &mut self.canvas,
            max_frames,
            on_frame,
        )
    }

    /// Claim the canvas for an export, suspending live drivers.
    pub fn begin_export(&mut self, kind: ExportKind) -> HalftoneResult<ExportTicket> {
        self.ensure_not_exporting()?;
        let resume_animation = self.animator.pause();
        let resume_preview = self.preview.pause();
        tracing::debug!(?kind, resume_animation, resume_preview, "export claimed canvas");
        self.export = Some(ActiveExport {
            kind,
            resume_animation,
            resume_preview,
        });
        Ok(ExportTicket { kind })
    }

    /// Release the canvas, resume suspended drivers, and redraw the current state.
    pub fn finish_export(&mut self, ticket: ExportTicket) -> HalftoneResult<()> {
        let Some(active) = self.export.take_if(|a| a.kind == ticket.kind) else {
            return Err(HalftoneError::validation(format!(
                "no {:?} export in progress",
                ticket.kind
            )));
        };
        if active.resume_animation {
            self.animator.resume();
        }
        if active.resume_preview {
            self.preview.resume();
        }
        self.render()?;
        Ok(())
    }

    /// Encode one loop of the animated image as GIF bytes; `None` when no image is loaded.
    pub fn export_gif<P>(
        &mut self,
        cancel: &CancelToken,
        progress: P,
    ) -> HalftoneResult<Option<Vec<u8>>>
    where
        P: FnMut(f64),
    {
        let ticket = self.begin_export(ExportKind::Gif)?;
        let result = match self.image.as_ref() {
            Some(image) => export_gif(
                &mut self.renderer,
                image,
                &self.params,
                &mut self.canvas,
                &self.config.gif,
                cancel,
                progress,
            )
            .map(Some),
            None => Ok(None),
        };
        let finished = self.finish_export(ticket);
        let bytes = result?;
        finished?;
        Ok(bytes)
    }

    /// Export the loaded video through `recorder`; `None` when no video is loaded.
    pub fn export_video<R, C, P>(
        &mut self,
        recorder: &mut R,
        clock: &mut C,
        cancel: &CancelToken,
        progress: P,
    ) -> HalftoneResult<Option<VideoExportReport>>
    where
        R: FrameRecorder + ?Sized,
        C: FrameClock + ?Sized,
        P: FnMut(VideoProgress),
    {
        let ticket = self.begin_export(ExportKind::Video)?;
        let result = match self.video.as_mut() {
            Some(video) => export_video(
                &mut self.renderer,
                video.as_mut(),
                &self.params,
                &mut self.canvas,
                recorder,
                clock,
                &self.config.video,
                cancel,
                progress,
            )
            .map(Some),
            None => Ok(None),
        };
        let finished = self.finish_export(ticket);
        let report = result?;
        finished?;
        Ok(report)
    }

    /// Save the current canvas as PNG.
    pub fn export_png(&self, path: &Path) -> HalftoneResult<()> {
        self.canvas.save_png(path)
    }
}

#[cfg(test)]
#[path = "../tests/unit/studio.rs"]
mod tests;
