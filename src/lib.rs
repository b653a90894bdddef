//! Per-tile halftone stylization of images and video.
//!
//! A source frame is divided into a square grid; each cell is sampled at its top-left pixel and
//! drawn as one primitive (black dot, colored dot, glowing LED dot, colored square, ASCII glyph or
//! duotone square) on a mode-specific background. [`Renderer`] is the frame pipeline, [`LiveAnimator`] and
//! [`VideoPreview`] drive it once per display refresh, and [`export_gif`] / [`export_video`]
//! drive it deterministically for export. [`Studio`] ties the pieces into one session.
#![forbid(unsafe_code)]

mod assets;
mod config;
mod export;
mod foundation;
mod render;
mod schedule;
mod studio;

pub use assets::font::{AsciiFont, FONT_ENV, discover_font};
pub use assets::media::{
    CACHE_CAPACITY_ENV, PREFETCH_FRAMES_ENV, SeekableSource, VideoInfo, VideoSource, probe_video,
};
pub use assets::source::{
    MAX_UPLOAD_BYTES, MediaKind, SourceFrame, SourceKind, VIDEO_EXTENSIONS, check_upload,
    decode_image, load_image, media_kind,
};
pub use config::StudioConfig;
pub use export::ffmpeg::{
    Container, FfmpegRecorder, ensure_parent_dir, is_ffmpeg_on_path, probe_encoders, select_codec,
};
pub use export::gif::{GifSettings, export_gif, write_asset};
pub use export::video::{
    FrameRecorder, VideoExportReport, VideoProgress, VideoSettings, export_video,
};
pub use foundation::color::{Rgb8, luma};
pub use foundation::core::{Fps, MAX_CANVAS_EDGE, Size};
pub use foundation::error::{HalftoneError, HalftoneResult};
pub use render::canvas::Canvas;
pub use render::params::{AnimationFlags, Mode, RenderParams};
pub use render::pipeline::{RenderOutcome, Renderer};
pub use render::tile::{
    ASCII_RAMP, Primitive, Tile, TileRenderer, TileStyle, renderer_for, tile_primitive,
};
pub use schedule::cancel::CancelToken;
pub use schedule::clock::{ClockEvent, DEFAULT_REFRESH_HZ, FrameClock, IntervalClock, ManualClock};
pub use schedule::live::{DriverState, LiveAnimator, PHASE_STEP, VideoPreview};
pub use studio::{Activity, ExportKind, ExportTicket, Studio};
