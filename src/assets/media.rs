use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::assets::source::{MediaKind, SourceFrame, check_upload};
use crate::foundation::core::{Fps, MAX_CANVAS_EDGE, Size};
use crate::foundation::error::{HalftoneError, HalftoneResult};

/// Overrides the decoded-frame cache size.
pub const CACHE_CAPACITY_ENV: &str = "HALFTONE_VIDEO_CACHE_CAPACITY";
/// Overrides how many frames one decoder invocation prefetches.
pub const PREFETCH_FRAMES_ENV: &str = "HALFTONE_VIDEO_PREFETCH_FRAMES";

const DEFAULT_CACHE_CAPACITY: usize = 64;
const DEFAULT_PREFETCH_FRAMES: u32 = 12;

/// A video that can be positioned at an arbitrary timestamp.
pub trait SeekableSource {
    /// Total length in seconds.
    fn duration_secs(&self) -> f64;

    /// Decoded frame shown at `time_secs`.
    fn frame_at(&mut self, time_secs: f64) -> HalftoneResult<SourceFrame>;
}

/// Stream facts reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Native frame rate, when the container declares one.
    pub frame_rate: Option<Fps>,
    pub duration_sec: f64,
}

impl VideoInfo {
    /// Native frame rate as a float, `0.0` when unknown.
    pub fn source_fps(&self) -> f64 {
        self.frame_rate.map_or(0.0, Fps::as_f64)
    }

    /// Dimensions frames are decoded at: the video sizing rule applied up front.
    pub fn decode_size(&self) -> Size {
        Size::new(self.width, self.height).fit_width(MAX_CANVAS_EDGE)
    }
}

#[cfg(feature = "media-ffmpeg")]
mod ff {
    use std::path::Path;
    use std::process::{Command, Output};

    use super::VideoInfo;
    use crate::foundation::core::Fps;
    use crate::foundation::error::{HalftoneError, HalftoneResult};

    #[derive(serde::Deserialize)]
    struct Report {
        #[serde(default)]
        streams: Vec<Stream>,
        format: Option<Format>,
    }

    #[derive(serde::Deserialize)]
    struct Stream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        avg_frame_rate: Option<String>,
        r_frame_rate: Option<String>,
        duration: Option<String>,
    }

    #[derive(serde::Deserialize)]
    struct Format {
        duration: Option<String>,
    }

    fn run(tool: &str, cmd: &mut Command, path: &Path) -> HalftoneResult<Vec<u8>> {
        let Output {
            status,
            stdout,
            stderr,
        } = cmd
            .output()
            .map_err(|e| HalftoneError::asset(format!("could not start {tool}: {e}")))?;
        if !status.success() {
            return Err(HalftoneError::asset(format!(
                "{tool} rejected '{}': {}",
                path.display(),
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(stdout)
    }

    /// `"30000/1001"` as an [`Fps`]; `"0/0"` and junk give `None`.
    pub(super) fn frame_rate(text: &str) -> Option<Fps> {
        let (num, den) = text.split_once('/')?;
        Fps::new(num.trim().parse().ok()?, den.trim().parse().ok()?).ok()
    }

    pub(super) fn probe(path: &Path) -> HalftoneResult<VideoInfo> {
        let stdout = run(
            "ffprobe",
            Command::new("ffprobe")
                .args(["-v", "error", "-of", "json", "-show_streams", "-show_format"])
                .arg(path),
            path,
        )?;
        let report: Report = serde_json::from_slice(&stdout)
            .map_err(|e| HalftoneError::asset(format!("unreadable ffprobe output: {e}")))?;

        let stream = report
            .streams
            .into_iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| {
                HalftoneError::asset(format!("'{}' has no video stream", path.display()))
            })?;
        let (Some(width), Some(height)) = (stream.width, stream.height) else {
            return Err(HalftoneError::asset("ffprobe reported no frame dimensions"));
        };
        if width == 0 || height == 0 {
            return Err(HalftoneError::asset(format!(
                "video frames are {width}x{height}"
            )));
        }
        let frame_rate = [stream.avg_frame_rate, stream.r_frame_rate]
            .into_iter()
            .flatten()
            .find_map(|r| frame_rate(&r));
        // The container length covers audio too, so the video stream's own length wins.
        let duration_sec = [stream.duration, report.format.and_then(|f| f.duration)]
            .into_iter()
            .flatten()
            .find_map(|d| d.parse::<f64>().ok().filter(|d| d.is_finite() && *d > 0.0))
            .unwrap_or(0.0);

        Ok(VideoInfo {
            path: path.to_path_buf(),
            width,
            height,
            frame_rate,
            duration_sec,
        })
    }

    /// Raw RGBA frames starting at `start_sec`, resampled to `cadence` at the decode size.
    pub(super) fn decode(
        info: &VideoInfo,
        start_sec: f64,
        count: u32,
        cadence: Fps,
    ) -> HalftoneResult<Vec<Vec<u8>>> {
        let size = info.decode_size();
        let frame_len = size.area() * 4;
        if count == 0 || frame_len == 0 {
            return Ok(Vec::new());
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-nostdin"])
            .args(["-ss", &format!("{start_sec:.6}")])
            .arg("-i")
            .arg(&info.path)
            .args([
                "-an",
                "-vf",
                &format!(
                    "fps={}/{},scale={}:{}",
                    cadence.num, cadence.den, size.width, size.height
                ),
                "-frames:v",
                &count.to_string(),
                "-pix_fmt",
                "rgba",
                "-f",
                "rawvideo",
                "-",
            ]);
        let stdout = run("ffmpeg", &mut cmd, &info.path)?;
        if stdout.len() % frame_len != 0 {
            return Err(HalftoneError::asset(format!(
                "ffmpeg produced {} bytes, not a whole number of {size} frames",
                stdout.len()
            )));
        }
        Ok(stdout.chunks_exact(frame_len).map(<[u8]>::to_vec).collect())
    }
}

/// Probe `path` with `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(path: &Path) -> HalftoneResult<VideoInfo> {
    ff::probe(path)
}

/// Probe `path` with `ffprobe`.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_path: &Path) -> HalftoneResult<VideoInfo> {
    Err(ffmpeg_disabled())
}

#[cfg(feature = "media-ffmpeg")]
fn decode_batch(
    info: &VideoInfo,
    start_sec: f64,
    count: u32,
    cadence: Fps,
) -> HalftoneResult<Vec<Vec<u8>>> {
    ff::decode(info, start_sec, count, cadence)
}

#[cfg(not(feature = "media-ffmpeg"))]
fn decode_batch(_: &VideoInfo, _: f64, _: u32, _: Fps) -> HalftoneResult<Vec<Vec<u8>>> {
    Err(ffmpeg_disabled())
}

#[cfg(not(feature = "media-ffmpeg"))]
fn ffmpeg_disabled() -> HalftoneError {
    HalftoneError::asset("video sources require the 'media-ffmpeg' feature")
}

/// Bounded frame cache keyed by timestamp in whole milliseconds, evicting the stalest entry.
#[derive(Debug)]
struct FrameCache {
    entries: HashMap<u64, (u64, SourceFrame)>,
    capacity: usize,
    clock: u64,
}

impl FrameCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    fn get(&mut self, key: u64) -> Option<SourceFrame> {
        self.clock += 1;
        let (used, frame) = self.entries.get_mut(&key)?;
        *used = self.clock;
        Some(frame.clone())
    }

    fn contains(&self, key: u64) -> bool {
        self.entries.contains_key(&key)
    }

    fn insert(&mut self, key: u64, frame: SourceFrame) {
        self.clock += 1;
        self.entries.insert(key, (self.clock, frame));
        while self.entries.len() > self.capacity {
            let stalest = self
                .entries
                .iter()
                .min_by_key(|(_, (used, _))| *used)
                .map(|(&k, _)| k);
            match stalest {
                Some(k) => self.entries.remove(&k),
                None => break,
            };
        }
    }
}

/// Video decoded through the system `ffmpeg`.
///
/// A cache miss decodes a whole window of frames on the export cadence, so a sequential export
/// spawns one decoder per window instead of one per frame. Seeks past the last frame the decoder
/// can produce hold that frame, the way a player does at the end of a clip.
#[derive(Debug)]
pub struct VideoSource {
    info: VideoInfo,
    cadence: Fps,
    cache: FrameCache,
    prefetch: u32,
    /// Latest decoded frame by timestamp.
    tail: Option<(u64, SourceFrame)>,
    /// First key the decoder returned nothing for.
    end_key: Option<u64>,
}

impl VideoSource {
    /// Check, probe and open `path`, prefetching at `cadence`.
    #[tracing::instrument]
    pub fn open(path: &Path, cadence: Fps) -> HalftoneResult<Self> {
        if check_upload(path)? != MediaKind::Video {
            return Err(HalftoneError::asset(format!(
                "'{}' is not a video file",
                path.display()
            )));
        }
        let info = probe_video(path)?;
        tracing::info!(
            size = %Size::new(info.width, info.height),
            duration = info.duration_sec,
            fps = info.source_fps(),
            "opened video"
        );
        Ok(Self::with_info(info, cadence))
    }

    /// Source for already-probed stream facts. Cache and window sizes follow the environment.
    pub fn with_info(info: VideoInfo, cadence: Fps) -> Self {
        let capacity = env_count(CACHE_CAPACITY_ENV).unwrap_or(DEFAULT_CACHE_CAPACITY);
        let prefetch = env_count(PREFETCH_FRAMES_ENV)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(DEFAULT_PREFETCH_FRAMES);
        Self {
            info,
            cadence,
            cache: FrameCache::new(capacity),
            prefetch,
            tail: None,
            end_key: None,
        }
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn key(time_secs: f64) -> u64 {
        (time_secs.max(0.0) * 1000.0).round() as u64
    }

    fn to_frame(&self, rgba: Vec<u8>) -> HalftoneResult<SourceFrame> {
        let size = self.info.decode_size();
        image::RgbaImage::from_raw(size.width, size.height, rgba)
            .map(SourceFrame::video)
            .ok_or_else(|| HalftoneError::asset("decoded frame does not match the video size"))
    }

    fn remember(&mut self, key: u64, frame: SourceFrame) {
        if self.tail.as_ref().is_none_or(|(k, _)| key >= *k) {
            self.tail = Some((key, frame.clone()));
        }
        self.cache.insert(key, frame);
    }

    fn mark_end(&mut self, key: u64) {
        self.end_key = Some(self.end_key.map_or(key, |end| end.min(key)));
    }

    /// The held last frame, when `key` lies at or past the end of the stream.
    fn past_end(&self, key: u64) -> Option<SourceFrame> {
        let end = self.end_key?;
        let (_, frame) = self.tail.as_ref()?;
        (key >= end).then(|| frame.clone())
    }

    /// Decode the window of `prefetch` cadence steps containing `key`.
    fn fill_window(&mut self, key: u64) -> HalftoneResult<()> {
        let step = self.cadence.frame_duration_secs();
        let index = (key as f64 / 1000.0 / step).round() as u64;
        let first = index - index % u64::from(self.prefetch.max(1));
        let start = first as f64 * step;

        let batch = decode_batch(&self.info, start, self.prefetch, self.cadence)?;
        tracing::debug!(start, decoded = batch.len(), "prefetched video window");
        let decoded = batch.len();
        for (i, rgba) in batch.into_iter().enumerate() {
            let k = Self::key(start + i as f64 * step);
            if !self.cache.contains(k) {
                let frame = self.to_frame(rgba)?;
                self.remember(k, frame);
            }
        }
        if decoded < self.prefetch as usize {
            self.mark_end(Self::key(start + decoded as f64 * step));
        }
        Ok(())
    }
}

impl SeekableSource for VideoSource {
    fn duration_secs(&self) -> f64 {
        self.info.duration_sec
    }

    fn frame_at(&mut self, time_secs: f64) -> HalftoneResult<SourceFrame> {
        let key = Self::key(time_secs);
        if let Some(frame) = self.cache.get(key).or_else(|| self.past_end(key)) {
            return Ok(frame);
        }
        if let Err(err) = self.fill_window(key) {
            tracing::debug!(%err, "window prefetch failed, decoding single frame");
        } else if let Some(frame) = self.cache.get(key).or_else(|| self.past_end(key)) {
            return Ok(frame);
        }

        // Off-grid seeks (preview scrubbing) decode just the one frame.
        let Some(rgba) = decode_batch(&self.info, time_secs.max(0.0), 1, self.cadence)?.pop()
        else {
            self.mark_end(key);
            return self.past_end(key).ok_or_else(|| {
                HalftoneError::asset(format!(
                    "no frame at {time_secs:.3}s in '{}'",
                    self.info.path.display()
                ))
            });
        };
        let frame = self.to_frame(rgba)?;
        self.remember(key, frame.clone());
        Ok(frame)
    }
}

fn env_count(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()?
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(width: u32, height: u32) -> VideoInfo {
        VideoInfo {
            path: PathBuf::from("clip.mp4"),
            width,
            height,
            frame_rate: Fps::new(30000, 1001).ok(),
            duration_sec: 2.0,
        }
    }

    fn solid(v: u8) -> SourceFrame {
        SourceFrame::video(image::RgbaImage::from_pixel(2, 2, image::Rgba([v, v, v, 255])))
    }

    #[test]
    fn decode_size_caps_width_only() {
        assert_eq!(info(3840, 2160).decode_size(), Size::new(1920, 1080));
        assert_eq!(info(640, 360).decode_size(), Size::new(640, 360));
        assert_eq!(info(1000, 4000).decode_size(), Size::new(1000, 4000));
        assert!((info(1, 1).source_fps() - 29.97).abs() < 0.01);
    }

    #[test]
    fn unknown_frame_rate_reads_as_zero() {
        let mut i = info(2, 2);
        i.frame_rate = None;
        assert_eq!(i.source_fps(), 0.0);
    }

    #[test]
    fn cache_drops_the_stalest_frame() {
        let mut cache = FrameCache::new(2);
        cache.insert(0, solid(0));
        cache.insert(33, solid(1));
        assert!(cache.get(0).is_some());
        cache.insert(67, solid(2));
        assert!(cache.contains(0));
        assert!(!cache.contains(33));
        assert!(cache.contains(67));
    }

    #[test]
    fn cached_frames_serve_seeks_without_decoding() {
        let mut src = VideoSource::with_info(info(2, 2), Fps::new(30, 1).unwrap());
        src.cache.insert(VideoSource::key(1.0 / 30.0), solid(9));
        let frame = src.frame_at(1.0 / 30.0).unwrap();
        assert_eq!(frame.image().get_pixel(1, 1).0, [9, 9, 9, 255]);
        assert_eq!(src.duration_secs(), 2.0);
    }

    #[test]
    fn seeks_past_the_end_hold_the_last_frame() {
        let mut src = VideoSource::with_info(info(2, 2), Fps::new(30, 1).unwrap());
        src.remember(VideoSource::key(1.8), solid(1));
        src.remember(VideoSource::key(1.9), solid(7));
        src.mark_end(VideoSource::key(1.9 + 1.0 / 30.0));

        for t in [1.95, 2.0] {
            let frame = src.frame_at(t).unwrap();
            assert_eq!(frame.image().get_pixel(0, 0).0, [7, 7, 7, 255]);
        }
        // Frames before the end still come from the cache.
        assert_eq!(src.frame_at(1.8).unwrap().image().get_pixel(0, 0).0, [1, 1, 1, 255]);
    }

    #[test]
    fn end_marker_only_moves_earlier() {
        let mut src = VideoSource::with_info(info(2, 2), Fps::new(30, 1).unwrap());
        src.mark_end(2000);
        src.mark_end(1933);
        src.mark_end(1967);
        assert_eq!(src.end_key, Some(1933));
        assert!(src.past_end(1950).is_none(), "no frame decoded yet");
    }

    #[test]
    fn missing_files_are_refused() {
        let err = VideoSource::open(
            Path::new("target/media_unit/absent.mp4"),
            Fps::new(30, 1).unwrap(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("asset error:"));
    }

    #[test]
    fn still_images_are_not_videos() {
        let dir = Path::new("target/media_unit");
        std::fs::create_dir_all(dir).unwrap();
        let png = dir.join("still.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(&png)
            .unwrap();
        let err = VideoSource::open(&png, Fps::new(30, 1).unwrap()).unwrap_err();
        assert!(err.to_string().contains("is not a video file"), "{err}");
    }

    #[cfg(feature = "media-ffmpeg")]
    #[test]
    fn frame_rate_text() {
        assert_eq!(ff::frame_rate("30000/1001"), Fps::new(30000, 1001).ok());
        assert_eq!(ff::frame_rate("0/0"), None);
        assert_eq!(ff::frame_rate("25/0"), None);
        assert_eq!(ff::frame_rate("abc"), None);
    }
}
