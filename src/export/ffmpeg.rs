use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::export::video::FrameRecorder;
use crate::foundation::core::{Fps, Size};
use crate::foundation::error::{HalftoneError, HalftoneResult};
use crate::render::canvas::Canvas;

/// Output container, chosen from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    WebM,
    Mp4,
}

impl Container {
    /// Container for `path`; anything but `.mp4`/`.m4v` is WebM.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("mp4" | "m4v") => Container::Mp4,
            _ => Container::WebM,
        }
    }

    /// Encoders in order of preference.
    pub fn preferred_codecs(self) -> &'static [&'static str] {
        match self {
            Container::WebM => &["libvpx-vp9", "libvpx"],
            Container::Mp4 => &["libx264"],
        }
    }
}

/// First preferred encoder for `container` that appears in an `ffmpeg -encoders` listing.
pub fn select_codec(container: Container, encoders_listing: &str) -> Option<&'static str> {
    container.preferred_codecs().iter().copied().find(|codec| {
        encoders_listing
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(*codec))
    })
}

/// Raw `ffmpeg -hide_banner -encoders` output.
pub fn probe_encoders() -> HalftoneResult<String> {
    let out = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| HalftoneError::encode(format!("failed to run ffmpeg -encoders: {e}")))?;
    if !out.status.success() {
        return Err(HalftoneError::encode(format!(
            "ffmpeg -encoders exited with status {}",
            out.status
        )));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// A running `ffmpeg` child with its stdin pipe and a thread collecting stderr.
struct Session {
    child: Child,
    stdin: ChildStdin,
    stderr: JoinHandle<Vec<u8>>,
    size: Size,
}

impl Session {
    fn spawn(mut cmd: Command, size: Size) -> HalftoneResult<Self> {
        let mut child = cmd.spawn().map_err(|e| {
            HalftoneError::encode(format!("could not spawn ffmpeg (is it on PATH?): {e}"))
        })?;
        let (Some(stdin), Some(mut pipe)) = (child.stdin.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(HalftoneError::encode("ffmpeg started without stdio pipes"));
        };
        let stderr = std::thread::spawn(move || {
            let mut log = Vec::new();
            let _ = pipe.read_to_end(&mut log);
            log
        });
        Ok(Self {
            child,
            stdin,
            stderr,
            size,
        })
    }

    /// Closes stdin and waits; a non-zero exit carries ffmpeg's own message.
    fn finish(self) -> HalftoneResult<()> {
        let Self {
            mut child,
            stdin,
            stderr,
            ..
        } = self;
        drop(stdin);
        let status = child
            .wait()
            .map_err(|e| HalftoneError::encode(format!("lost track of ffmpeg: {e}")))?;
        let log = stderr.join().unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(HalftoneError::encode(format!(
                "ffmpeg exited with {status}: {}",
                String::from_utf8_lossy(&log).trim()
            )))
        }
    }

    fn kill(self) {
        let Self {
            mut child,
            stdin,
            stderr,
            ..
        } = self;
        drop(stdin);
        let _ = child.kill();
        let _ = child.wait();
        let _ = stderr.join();
    }
}

/// [`FrameRecorder`] that streams canvases as raw RGBA into the system `ffmpeg`.
pub struct FfmpegRecorder {
    out_path: PathBuf,
    container: Container,
    codec: &'static str,
    bitrate: u32,
    session: Option<Session>,
}

impl std::fmt::Debug for FfmpegRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegRecorder")
            .field("out_path", &self.out_path)
            .field("codec", &self.codec)
            .field("bitrate", &self.bitrate)
            .field("recording", &self.session.as_ref().map(|s| s.size))
            .finish()
    }
}

impl FfmpegRecorder {
    /// Probe `ffmpeg` for an encoder matching the container of `out_path`.
    ///
    /// Fails with an encode error when `ffmpeg` is missing or has no suitable encoder, before
    /// anything is written.
    pub fn new(out_path: impl Into<PathBuf>, bitrate: u32) -> HalftoneResult<Self> {
        let out_path = out_path.into();
        if !is_ffmpeg_on_path() {
            return Err(HalftoneError::encode(
                "video export needs ffmpeg, which is not on PATH",
            ));
        }
        let container = Container::from_path(&out_path);
        let preferred = container.preferred_codecs();
        let codec = select_codec(container, &probe_encoders()?).ok_or_else(|| {
            HalftoneError::encode(format!(
                "ffmpeg has none of {} for {container:?}",
                preferred.join(", ")
            ))
        })?;
        if Some(&codec) != preferred.first() {
            tracing::warn!(codec, "preferred encoder unavailable, falling back");
        }
        Ok(Self::with_codec(out_path, container, codec, bitrate))
    }

    fn with_codec(
        out_path: PathBuf,
        container: Container,
        codec: &'static str,
        bitrate: u32,
    ) -> Self {
        Self {
            out_path,
            container,
            codec,
            bitrate,
            session: None,
        }
    }

    pub fn codec(&self) -> &'static str {
        self.codec
    }

    pub fn out_path(&self) -> &Path {
        &self.out_path
    }

    fn command(&self, size: Size, fps: Fps) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args(["-y", "-loglevel", "error", "-nostats"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-video_size", &size.to_string()])
            .args(["-framerate", &format!("{}/{}", fps.num, fps.den)])
            .args(["-i", "-", "-an"])
            // yuv420p needs even dimensions.
            .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2", "-pix_fmt", "yuv420p"])
            .args(["-c:v", self.codec, "-b:v", &self.bitrate.to_string()]);
        if self.container == Container::Mp4 {
            cmd.args(["-movflags", "+faststart"]);
        }
        cmd.arg(&self.out_path);
        cmd
    }

    fn discard_output(&self) {
        match std::fs::remove_file(&self.out_path) {
            Ok(()) => tracing::debug!(out = %self.out_path.display(), "removed partial video"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, "could not remove partial video"),
        }
    }
}

impl FrameRecorder for FfmpegRecorder {
    fn start(&mut self, size: Size, fps: Fps) -> HalftoneResult<()> {
        if self.session.is_some() {
            return Err(HalftoneError::encode("recorder already started"));
        }
        if size.is_empty() {
            return Err(HalftoneError::validation(format!(
                "cannot record {size} frames"
            )));
        }
        ensure_parent_dir(&self.out_path)?;
        self.session = Some(Session::spawn(self.command(size, fps), size)?);
        tracing::info!(
            codec = self.codec,
            %size,
            out = %self.out_path.display(),
            "recorder started"
        );
        Ok(())
    }

    fn capture(&mut self, canvas: &Canvas) -> HalftoneResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| HalftoneError::encode("recorder not started"))?;
        if canvas.size() != session.size {
            return Err(HalftoneError::validation(format!(
                "captured {} frame into a {} recording",
                canvas.size(),
                session.size
            )));
        }
        // Canvas pixels are opaque, so they go to ffmpeg as-is.
        session
            .stdin
            .write_all(canvas.data())
            .map_err(|e| HalftoneError::encode(format!("ffmpeg stopped reading frames: {e}")))
    }

    fn stop(&mut self) -> HalftoneResult<()> {
        let session = self
            .session
            .take()
            .ok_or_else(|| HalftoneError::encode("recorder not started"))?;
        if let Err(e) = session.finish() {
            self.discard_output();
            return Err(e);
        }
        tracing::info!(out = %self.out_path.display(), "recorder stopped");
        Ok(())
    }

    fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            session.kill();
        }
        self.discard_output();
        tracing::info!(out = %self.out_path.display(), "recorder aborted");
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.abort();
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> HalftoneResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
