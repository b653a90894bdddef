//! Refresh-driven preview loops.
//!
//! Both drivers render once per display refresh and stop between frames when their
//! [`CancelToken`] fires. Phase advances per refresh rather than per second, so a slower display
//! animates more slowly.

use std::time::Duration;

use crate::assets::media::SeekableSource;
use crate::assets::source::SourceFrame;
use crate::foundation::error::HalftoneResult;
use crate::render::canvas::Canvas;
use crate::render::params::{AnimationFlags, RenderParams};
use crate::render::pipeline::{RenderOutcome, Renderer};
use crate::schedule::cancel::CancelToken;
use crate::schedule::clock::FrameClock;

/// Phase added before each animated frame, in radians.
pub const PHASE_STEP: f64 = 0.05;

/// Lifecycle of a live driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Not rendering.
    Idle,
    /// Rendering on every refresh.
    Running,
    /// Suspended by an export; resumes where it left off.
    Paused,
}

/// Animated preview of a still image.
#[derive(Debug)]
pub struct LiveAnimator {
    state: DriverState,
    phase: f64,
    token: CancelToken,
}

impl Default for LiveAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveAnimator {
    pub fn new() -> Self {
        Self {
            state: DriverState::Idle,
            phase: 0.0,
            token: CancelToken::new(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Accumulated phase; it keeps growing across stop/start.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Enter `Running` and return the token that stops this run.
    pub fn start(&mut self) -> CancelToken {
        if self.state != DriverState::Running || self.token.is_cancelled() {
            self.token = CancelToken::new();
        }
        self.state = DriverState::Running;
        tracing::debug!(phase = self.phase, "live animation started");
        self.token.clone()
    }

    /// Cancel the current run and return to `Idle`.
    pub fn stop(&mut self) {
        self.token.cancel();
        self.state = DriverState::Idle;
    }

    /// Suspend a running animation; a no-op otherwise. Returns whether it was running.
    pub fn pause(&mut self) -> bool {
        if self.state == DriverState::Running && !self.token.is_cancelled() {
            self.state = DriverState::Paused;
            return true;
        }
        false
    }

    /// Continue after [`LiveAnimator::pause`].
    pub fn resume(&mut self) {
        if self.state == DriverState::Paused {
            self.state = DriverState::Running;
        }
    }

    /// Render the next animated frame, or `None` when not running.
    pub fn tick(
        &mut self,
        renderer: &mut Renderer,
        source: Option<&SourceFrame>,
        params: &RenderParams,
        canvas: &mut Canvas,
    ) -> HalftoneResult<Option<RenderOutcome>> {
        if self.token.is_cancelled() {
            self.state = DriverState::Idle;
        }
        if self.state != DriverState::Running {
            return Ok(None);
        }
        self.phase += PHASE_STEP;
        let outcome = renderer.render(
            source,
            &params.at_time(self.phase),
            AnimationFlags::LIVE,
            canvas,
        )?;
        tracing::debug!(phase = self.phase, "animated frame");
        Ok(Some(outcome))
    }

    /// Start and keep rendering once per refresh until cancelled or `max_frames` frames were
    /// shown. `on_frame` sees every finished canvas. Returns the number of frames rendered.
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip_all, fields(max_frames = ?max_frames))]
    pub fn run<C, F>(
        &mut self,
        clock: &mut C,
        renderer: &mut Renderer,
        source: Option<&SourceFrame>,
        params: &RenderParams,
        canvas: &mut Canvas,
        max_frames: Option<u64>,
        mut on_frame: F,
    ) -> HalftoneResult<u64>
    where
        C: FrameClock + ?Sized,
        F: FnMut(u64, &Canvas) -> HalftoneResult<()>,
    {
        let token = self.start();
        let mut frames = 0u64;
        while !token.is_cancelled() && max_frames.is_none_or(|max| frames < max) {
            clock.wait_refresh();
            if token.is_cancelled() {
                break;
            }
            if self.tick(renderer, source, params, canvas)?.is_none() {
                break;
            }
            on_frame(frames, canvas)?;
            frames += 1;
        }
        if self.state == DriverState::Running {
            self.state = DriverState::Idle;
        }
        tracing::info!(frames, phase = self.phase, "live animation stopped");
        Ok(frames)
    }
}

/// Live preview of a video: renders the current playback position on every refresh and loops.
#[derive(Debug)]
pub struct VideoPreview {
    state: DriverState,
    position: f64,
    token: CancelToken,
}

impl Default for VideoPreview {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoPreview {
    pub fn new() -> Self {
        Self {
            state: DriverState::Idle,
            position: 0.0,
            token: CancelToken::new(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Playback position in seconds.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Start playback from the beginning.
    pub fn start(&mut self) -> CancelToken {
        self.position = 0.0;
        self.token = CancelToken::new();
        self.state = DriverState::Running;
        self.token.clone()
    }

    pub fn stop(&mut self) {
        self.token.cancel();
        self.state = DriverState::Idle;
    }

    /// Suspend playback; returns whether it was running.
    pub fn pause(&mut self) -> bool {
        if self.state == DriverState::Running && !self.token.is_cancelled() {
            self.state = DriverState::Paused;
            return true;
        }
        false
    }

    /// Restart playback from 0 after [`VideoPreview::pause`].
    pub fn resume(&mut self) {
        if self.state == DriverState::Paused {
            self.position = 0.0;
            self.state = DriverState::Running;
        }
    }

    /// Render the frame at the current position, then advance it by `elapsed`, wrapping to 0 at
    /// the end of the video.
    pub fn tick<S>(
        &mut self,
        elapsed: Duration,
        source: &mut S,
        renderer: &mut Renderer,
        params: &RenderParams,
        canvas: &mut Canvas,
    ) -> HalftoneResult<Option<RenderOutcome>>
    where
        S: SeekableSource + ?Sized,
    {
        if self.token.is_cancelled() {
            self.state = DriverState::Idle;
        }
        if self.state != DriverState::Running {
            return Ok(None);
        }
        let frame = source.frame_at(self.position)?;
        let outcome = renderer.render_video_frame(Some(&frame), params, canvas)?;
        tracing::debug!(position = self.position, "preview frame");

        self.position += elapsed.as_secs_f64();
        if self.position >= source.duration_secs() {
            self.position = 0.0;
        }
        Ok(Some(outcome))
    }

    /// Start and render once per refresh until cancelled or `max_frames` frames were shown.
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip_all, fields(max_frames = ?max_frames))]
    pub fn run<C, S, F>(
        &mut self,
        clock: &mut C,
        source: &mut S,
        renderer: &mut Renderer,
        params: &RenderParams,
        canvas: &mut Canvas,
        max_frames: Option<u64>,
        mut on_frame: F,
    ) -> HalftoneResult<u64>
    where
        C: FrameClock + ?Sized,
        S: SeekableSource + ?Sized,
        F: FnMut(u64, &Canvas) -> HalftoneResult<()>,
    {
        let token = self.start();
        let mut frames = 0u64;
        while !token.is_cancelled() && max_frames.is_none_or(|max| frames < max) {
            let elapsed = clock.wait_refresh();
            if token.is_cancelled() {
                break;
            }
            if self.tick(elapsed, source, renderer, params, canvas)?.is_none() {
                break;
            }
            on_frame(frames, canvas)?;
            frames += 1;
        }
        if self.state == DriverState::Running {
            self.state = DriverState::Idle;
        }
        Ok(frames)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/live.rs"]
mod tests;
