use serde::{Deserialize, Serialize};

use crate::assets::media::SeekableSource;
use crate::foundation::core::{Fps, Size};
use crate::foundation::error::{HalftoneError, HalftoneResult};
use crate::render::canvas::Canvas;
use crate::render::params::RenderParams;
use crate::render::pipeline::Renderer;
use crate::schedule::cancel::CancelToken;
use crate::schedule::clock::FrameClock;

/// Consumer of canvas snapshots at a fixed rate, such as a streaming video encoder.
///
/// Ordering contract: `start` once, `capture` in strictly increasing time order, then exactly
/// one of `stop` (keep the output) or `abort` (discard it).
pub trait FrameRecorder {
    /// Called once with the canvas size before the first capture.
    fn start(&mut self, size: Size, fps: Fps) -> HalftoneResult<()>;
    /// Record the current canvas as the next frame.
    fn capture(&mut self, canvas: &Canvas) -> HalftoneResult<()>;
    /// Finish and keep the output.
    fn stop(&mut self) -> HalftoneResult<()>;
    /// Tear down and discard any partial output.
    fn abort(&mut self);
}

/// Video export parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Frames per second, also the seek cadence over the source.
    pub fps: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            bitrate: 5_000_000,
        }
    }
}

impl VideoSettings {
    pub fn validate(&self) -> HalftoneResult<()> {
        if self.bitrate == 0 {
            return Err(HalftoneError::validation("video bitrate must be > 0"));
        }
        self.frame_rate().map(|_| ())
    }

    pub fn frame_rate(&self) -> HalftoneResult<Fps> {
        Fps::new(self.fps, 1)
    }
}

/// Where a video export is, reported after each captured frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoProgress {
    /// Frames captured so far.
    pub frame: u64,
    /// Frames the export will capture.
    pub total: u64,
    /// Source timestamp of the last captured frame.
    pub time_secs: f64,
}

impl VideoProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.frame as f64 / self.total as f64
        }
    }
}

/// Summary of a finished video export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoExportReport {
    pub frames: u64,
    pub size: Size,
    pub fps: Fps,
}

/// Frame-accurate export of a whole video through the pipeline.
///
/// Captures `floor(duration * fps)` frames at `i / fps`, waiting one frame interval on `clock`
/// between captures and once more after the last one before the recorder stops. Any error or a
/// cancellation aborts the recorder so no partial output survives.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip_all, fields(fps = settings.fps))]
pub fn export_video<S, R, C, P>(
    renderer: &mut Renderer,
    source: &mut S,
    params: &RenderParams,
    canvas: &mut Canvas,
    recorder: &mut R,
    clock: &mut C,
    settings: &VideoSettings,
    cancel: &CancelToken,
    progress: P,
) -> HalftoneResult<VideoExportReport>
where
    S: SeekableSource + ?Sized,
    R: FrameRecorder + ?Sized,
    C: FrameClock + ?Sized,
    P: FnMut(VideoProgress),
{
    settings.validate()?;
    let fps = settings.frame_rate()?;
    let duration = source.duration_secs();
    let total = fps.secs_to_frames_floor(duration);
    if total == 0 {
        return Err(HalftoneError::validation(format!(
            "video of {duration:.3}s is shorter than one frame at {} fps",
            settings.fps
        )));
    }
    tracing::info!(duration, total, "video export started");

    let mut started = false;
    let result = record_frames(
        renderer,
        source,
        params,
        canvas,
        recorder,
        clock,
        fps,
        total,
        cancel,
        progress,
        &mut started,
    );

    match result {
        Ok(size) => {
            recorder.stop()?;
            tracing::info!(frames = total, %size, "video export finished");
            Ok(VideoExportReport {
                frames: total,
                size,
                fps,
            })
        }
        Err(err) => {
            if started {
                recorder.abort();
            }
            if err.is_cancelled() {
                tracing::info!("video export cancelled");
            } else {
                tracing::warn!(error = %err, "video export failed");
            }
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn record_frames<S, R, C, P>(
    renderer: &mut Renderer,
    source: &mut S,
    params: &RenderParams,
    canvas: &mut Canvas,
    recorder: &mut R,
    clock: &mut C,
    fps: Fps,
    total: u64,
    cancel: &CancelToken,
    mut progress: P,
    started: &mut bool,
) -> HalftoneResult<Size>
where
    S: SeekableSource + ?Sized,
    R: FrameRecorder + ?Sized,
    C: FrameClock + ?Sized,
    P: FnMut(VideoProgress),
{
    let interval = fps.frame_interval();
    let mut size = Size::new(0, 0);

    for i in 0..total {
        cancel.check()?;
        if i > 0 {
            clock.wait(interval);
        }

        let t = fps.frame_time_secs(i);
        let frame = source.frame_at(t)?;
        renderer.render_video_frame(Some(&frame), params, canvas)?;

        if !*started {
            size = canvas.size();
            recorder.start(size, fps)?;
            *started = true;
        } else if canvas.size() != size {
            return Err(HalftoneError::render(format!(
                "frame {i} rendered at {} but the recording is {size}",
                canvas.size()
            )));
        }
        recorder.capture(canvas)?;
        tracing::debug!(frame = i, t, "video frame captured");
        progress(VideoProgress {
            frame: i + 1,
            total,
            time_secs: t,
        });
    }

    // Let the last frame sit for its full interval before the recorder closes.
    cancel.check()?;
    clock.wait(interval);
    Ok(size)
}
